//! Motion effects applied to a scene's still image.
//!
//! Every effect is linear in elapsed time over the scene's declared duration. Crop and
//! rotate stages read the stream clock (`t`), zoompan counts output frames (`on`), so
//! both progress terms saturate at 1 when the scene runs past its nominal length.

use super::filters::{fmt_num, Expr, Filter, FilterChain, ScaleFit};
use super::profile::RenderProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionEffect {
    #[default]
    None,
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    PanBidirectional,
    KenBurns,
    KenBurnsCenter,
    RotateSlow,
    RotateFast,
    FadeIn,
    FadeOut,
}

impl MotionEffect {
    #[cfg(test)]
    pub const ALL: [MotionEffect; 14] = [
        MotionEffect::None,
        MotionEffect::ZoomIn,
        MotionEffect::ZoomOut,
        MotionEffect::PanLeft,
        MotionEffect::PanRight,
        MotionEffect::PanUp,
        MotionEffect::PanDown,
        MotionEffect::PanBidirectional,
        MotionEffect::KenBurns,
        MotionEffect::KenBurnsCenter,
        MotionEffect::RotateSlow,
        MotionEffect::RotateFast,
        MotionEffect::FadeIn,
        MotionEffect::FadeOut,
    ];

    /// Unknown names map to [`MotionEffect::None`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "zoom-in" => Self::ZoomIn,
            "zoom-out" => Self::ZoomOut,
            "pan-left" => Self::PanLeft,
            "pan-right" => Self::PanRight,
            "pan-up" => Self::PanUp,
            "pan-down" => Self::PanDown,
            "pan-bidirectional" | "pan-lr" | "pan-rl" => Self::PanBidirectional,
            "ken-burns" => Self::KenBurns,
            "ken-burns-center" => Self::KenBurnsCenter,
            "rotate-slow" => Self::RotateSlow,
            "rotate-fast" => Self::RotateFast,
            "fade-in" => Self::FadeIn,
            "fade-out" => Self::FadeOut,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
            Self::PanLeft => "pan-left",
            Self::PanRight => "pan-right",
            Self::PanUp => "pan-up",
            Self::PanDown => "pan-down",
            Self::PanBidirectional => "pan-bidirectional",
            Self::KenBurns => "ken-burns",
            Self::KenBurnsCenter => "ken-burns-center",
            Self::RotateSlow => "rotate-slow",
            Self::RotateFast => "rotate-fast",
            Self::FadeIn => "fade-in",
            Self::FadeOut => "fade-out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectIntensity {
    Low,
    #[default]
    Medium,
    High,
}

impl EffectIntensity {
    /// Unknown names map to [`EffectIntensity::Medium`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }

    pub fn params(&self) -> MotionParams {
        match self {
            Self::Low => MotionParams {
                zoom_factor: 1.1,
                pan_distance: 50,
            },
            Self::Medium => MotionParams {
                zoom_factor: 1.2,
                pan_distance: 100,
            },
            Self::High => MotionParams {
                zoom_factor: 1.3,
                pan_distance: 150,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// Peak zoom reached at the end of a zoom-in.
    pub zoom_factor: f64,
    /// Pixels travelled by a pan over the whole scene.
    pub pan_distance: u32,
}

/// How the foreground relates to the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// No backdrop: cover the frame exactly, cropping overflow.
    Fill,
    /// Backdrop present: keep the aspect ratio and stay inside the frame.
    Overlay,
}

struct Motion {
    width: u32,
    height: u32,
    fps: u32,
    duration: f64,
    params: MotionParams,
}

impl Motion {
    /// 0..1 over the scene, by stream time.
    fn time_progress(&self) -> String {
        format!("min(t/{},1)", fmt_num(self.duration))
    }

    /// 0..1 over the scene, by zoompan output frame.
    fn frame_progress(&self) -> String {
        let frames = (self.duration * self.fps as f64).round().max(1.0);
        format!("min(on/{},1)", fmt_num(frames))
    }

    fn zoom_in(&self) -> Expr {
        Expr::new(format!(
            "1+{}*{}",
            fmt_num(self.params.zoom_factor - 1.0),
            self.frame_progress()
        ))
    }

    fn zoom_out(&self) -> Expr {
        Expr::new(format!(
            "{}-{}*{}",
            fmt_num(self.params.zoom_factor),
            fmt_num(self.params.zoom_factor - 1.0),
            self.frame_progress()
        ))
    }

    fn zoompan(&self, zoom: Expr, x: Expr) -> Filter {
        Filter::ZoomPan {
            zoom,
            x,
            y: Expr::new("ih/2-(ih/zoom/2)"),
            width: self.width,
            height: self.height,
            fps: self.fps,
        }
    }

    fn centered_x() -> Expr {
        Expr::new("iw/2-(iw/zoom/2)")
    }

    /// Starts centered and drifts right by the pan distance, clamped to the zoomed view.
    fn drifting_x(&self) -> Expr {
        Expr::new(format!(
            "min(iw/2-(iw/zoom/2)+{}*{},iw-iw/zoom)",
            self.params.pan_distance,
            self.frame_progress()
        ))
    }

    fn rotate_angle(&self, turns: f64) -> Expr {
        Expr::new(format!(
            "PI*2*{}*{}",
            fmt_num(turns),
            self.time_progress()
        ))
    }

    fn fade(&self, fade_in: bool, alpha: bool) -> Filter {
        let half = self.duration / 2.0;
        Filter::Fade {
            fade_in,
            start: if fade_in { 0.0 } else { half },
            duration: half,
            alpha,
        }
    }

    /// Cover-scales to `width`x`height` and center-crops to exactly that size.
    fn cover(width: u32, height: u32) -> FilterChain {
        FilterChain::of(vec![
            Filter::Scale {
                width,
                height,
                fit: Some(ScaleFit::Cover),
            },
            Filter::Crop {
                width,
                height,
                x: Expr::new(format!("(iw-{})/2", width)),
                y: Expr::new(format!("(ih-{})/2", height)),
            },
        ])
    }

    fn pan_crop(&self, x: Expr, y: Expr) -> Filter {
        Filter::Crop {
            width: self.width,
            height: self.height,
            x,
            y,
        }
    }

    fn fill(&self, effect: MotionEffect) -> FilterChain {
        let (w, h) = (self.width, self.height);
        let pan = self.params.pan_distance;
        let progress = self.time_progress();

        let mut chain = match effect {
            MotionEffect::None => Self::cover(w, h),
            MotionEffect::FadeIn | MotionEffect::FadeOut => {
                let mut chain = Self::cover(w, h);
                chain.push(self.fade(effect == MotionEffect::FadeIn, false));
                chain
            }
            MotionEffect::ZoomIn | MotionEffect::KenBurnsCenter => {
                let mut chain = Self::cover(w, h);
                chain.push(self.zoompan(self.zoom_in(), Self::centered_x()));
                chain
            }
            MotionEffect::ZoomOut => {
                let mut chain = Self::cover(w, h);
                chain.push(self.zoompan(self.zoom_out(), Self::centered_x()));
                chain
            }
            MotionEffect::KenBurns => {
                let mut chain = Self::cover(w, h);
                chain.push(self.zoompan(self.zoom_in(), self.drifting_x()));
                chain
            }
            MotionEffect::PanLeft => {
                let mut chain = Self::cover(w + pan, h);
                chain.push(self.pan_crop(
                    Expr::new(format!("min(iw-{},{}*{})", w, pan, progress)),
                    Expr::num(0.0),
                ));
                chain
            }
            MotionEffect::PanRight => {
                let mut chain = Self::cover(w + pan, h);
                chain.push(self.pan_crop(
                    Expr::new(format!("max(0,iw-{}-{}*{})", w, pan, progress)),
                    Expr::num(0.0),
                ));
                chain
            }
            MotionEffect::PanUp => {
                let mut chain = Self::cover(w, h + pan);
                chain.push(self.pan_crop(
                    Expr::num(0.0),
                    Expr::new(format!("max(0,ih-{}-{}*{})", h, pan, progress)),
                ));
                chain
            }
            MotionEffect::PanDown => {
                let mut chain = Self::cover(w, h + pan);
                chain.push(self.pan_crop(
                    Expr::num(0.0),
                    Expr::new(format!("min(ih-{},{}*{})", h, pan, progress)),
                ));
                chain
            }
            MotionEffect::PanBidirectional => {
                let mut chain = Self::cover(w + pan * 2, h);
                chain.push(self.pan_crop(
                    Expr::new(format!("min(iw-{},{}*{})", w, pan * 2, progress)),
                    Expr::num(0.0),
                ));
                chain
            }
            MotionEffect::RotateSlow | MotionEffect::RotateFast => {
                // A square as wide as the frame diagonal keeps every corner covered.
                let diagonal = ((w as f64).hypot(h as f64).ceil() as u32).next_multiple_of(2);
                let turns = if effect == MotionEffect::RotateSlow {
                    0.25
                } else {
                    0.5
                };
                let mut chain = Self::cover(diagonal, diagonal);
                chain.push(Filter::Rotate {
                    angle: self.rotate_angle(turns),
                    size: Some((w, h)),
                    fill: "black".to_string(),
                });
                chain
            }
        };
        chain.push(Filter::SetSar);
        chain
    }

    fn overlay(&self, effect: MotionEffect) -> FilterChain {
        let (w, h) = (self.width, self.height);
        let mut chain = FilterChain::of(vec![Filter::Scale {
            width: w,
            height: h,
            fit: Some(ScaleFit::Contain),
        }]);

        // Zooms run on a transparent frame-sized canvas so the image's own box is
        // what grows, not a stretched copy of it.
        let zoom = |chain: &mut FilterChain, filter: Filter| {
            chain
                .push(Filter::Format("rgba"))
                .push(Filter::Pad {
                    width: w,
                    height: h,
                    color: "black@0".to_string(),
                })
                .push(filter);
        };

        match effect {
            MotionEffect::ZoomIn | MotionEffect::KenBurns | MotionEffect::KenBurnsCenter => {
                zoom(&mut chain, self.zoompan(self.zoom_in(), Self::centered_x()))
            }
            MotionEffect::ZoomOut => {
                zoom(&mut chain, self.zoompan(self.zoom_out(), Self::centered_x()))
            }
            MotionEffect::RotateSlow | MotionEffect::RotateFast => {
                let turns = if effect == MotionEffect::RotateSlow {
                    0.25
                } else {
                    0.5
                };
                chain.push(Filter::Format("rgba")).push(Filter::Rotate {
                    angle: self.rotate_angle(turns),
                    size: None,
                    fill: "none".to_string(),
                });
            }
            MotionEffect::FadeIn | MotionEffect::FadeOut => {
                chain
                    .push(Filter::Format("rgba"))
                    .push(self.fade(effect == MotionEffect::FadeIn, true));
            }
            // Pans need overflow to travel through; a fitted image has none.
            MotionEffect::None
            | MotionEffect::PanLeft
            | MotionEffect::PanRight
            | MotionEffect::PanUp
            | MotionEffect::PanDown
            | MotionEffect::PanBidirectional => {}
        }
        chain.push(Filter::SetSar);
        chain
    }
}

/// Builds the foreground chain for one scene image.
pub fn motion_chain(
    effect: MotionEffect,
    intensity: EffectIntensity,
    duration: f64,
    geometry: Geometry,
    profile: &RenderProfile,
) -> FilterChain {
    let motion = Motion {
        width: profile.width,
        height: profile.height,
        fps: profile.fps,
        duration: duration.max(0.1),
        params: intensity.params(),
    };
    match geometry {
        Geometry::Fill => motion.fill(effect),
        Geometry::Overlay => motion.overlay(effect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::filters::Extent;

    const INTENSITIES: [EffectIntensity; 3] = [
        EffectIntensity::Low,
        EffectIntensity::Medium,
        EffectIntensity::High,
    ];

    #[test]
    fn names_parse_with_aliases_and_fallback() {
        assert_eq!(MotionEffect::from_name("Ken-Burns"), MotionEffect::KenBurns);
        assert_eq!(MotionEffect::from_name("pan-lr"), MotionEffect::PanBidirectional);
        assert_eq!(MotionEffect::from_name("pan-rl"), MotionEffect::PanBidirectional);
        assert_eq!(MotionEffect::from_name("zoom-pulse"), MotionEffect::None);
        assert_eq!(EffectIntensity::from_name("HIGH"), EffectIntensity::High);
        assert_eq!(EffectIntensity::from_name("extreme"), EffectIntensity::Medium);

        for effect in MotionEffect::ALL {
            assert_eq!(MotionEffect::from_name(effect.as_str()), effect);
        }
    }

    #[test]
    fn fill_mode_always_ends_exactly_at_frame_size() {
        let profile = RenderProfile::shorts_scene();
        for effect in MotionEffect::ALL {
            for intensity in INTENSITIES {
                for duration in [0.5, 3.5, 12.0] {
                    let chain = motion_chain(effect, intensity, duration, Geometry::Fill, &profile);
                    assert_eq!(
                        chain.extent(),
                        Extent::Exact(1080, 1920),
                        "{} / {:?} / {}: {}",
                        effect.as_str(),
                        intensity,
                        duration,
                        chain
                    );
                }
            }
        }
    }

    #[test]
    fn overlay_mode_never_exceeds_the_frame() {
        let profile = RenderProfile::shorts_scene();
        for effect in MotionEffect::ALL {
            for intensity in INTENSITIES {
                let chain = motion_chain(effect, intensity, 4.0, Geometry::Overlay, &profile);
                assert!(
                    chain.extent().fits_within(1080, 1920),
                    "{}: {}",
                    effect.as_str(),
                    chain
                );
            }
        }
    }

    #[test]
    fn zoom_in_is_parameterized_by_intensity_and_frame_count() {
        let profile = RenderProfile::shorts_scene();
        let chain = motion_chain(
            MotionEffect::ZoomIn,
            EffectIntensity::High,
            4.0,
            Geometry::Fill,
            &profile,
        );
        let rendered = chain.to_string();
        assert!(rendered.contains("zoompan=z='1+0.3*min(on/120,1)'"), "{}", rendered);
        assert!(rendered.contains("s=1080x1920:fps=30"));
    }

    #[test]
    fn pans_travel_the_intensity_distance_over_the_duration() {
        let profile = RenderProfile::shorts_scene();
        let chain = motion_chain(
            MotionEffect::PanLeft,
            EffectIntensity::Low,
            5.0,
            Geometry::Fill,
            &profile,
        );
        assert_eq!(
            chain.to_string(),
            "scale=1130:1920:force_original_aspect_ratio=increase,\
             crop=1130:1920:'(iw-1130)/2':'(ih-1920)/2',\
             crop=1080:1920:'min(iw-1080,50*min(t/5,1))':0,setsar=1"
        );
    }

    #[test]
    fn overlay_pans_degrade_to_static_fit() {
        let profile = RenderProfile::shorts_scene();
        let pan = motion_chain(
            MotionEffect::PanUp,
            EffectIntensity::Medium,
            3.0,
            Geometry::Overlay,
            &profile,
        );
        let none = motion_chain(
            MotionEffect::None,
            EffectIntensity::Medium,
            3.0,
            Geometry::Overlay,
            &profile,
        );
        assert_eq!(pan, none);
    }

    #[test]
    fn overlay_zoom_pads_onto_transparent_canvas() {
        let profile = RenderProfile::shorts_scene();
        let rendered = motion_chain(
            MotionEffect::ZoomOut,
            EffectIntensity::Medium,
            3.0,
            Geometry::Overlay,
            &profile,
        )
        .to_string();
        assert!(rendered.contains("format=rgba,pad=1080:1920:(ow-iw)/2:(oh-ih)/2:color=black@0"));
        assert!(rendered.contains("z='1.2-0.2*min(on/90,1)'"));
    }

    #[test]
    fn rotation_in_fill_mode_covers_the_diagonal() {
        let profile = RenderProfile::shorts_scene();
        let rendered = motion_chain(
            MotionEffect::RotateSlow,
            EffectIntensity::Medium,
            8.0,
            Geometry::Fill,
            &profile,
        )
        .to_string();
        assert!(rendered.starts_with("scale=2204:2204"), "{}", rendered);
        assert!(rendered.contains("rotate=a='PI*2*0.25*min(t/8,1)':ow=1080:oh=1920:c=black"));
    }
}
