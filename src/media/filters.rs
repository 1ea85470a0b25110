//! Typed filter graph values.
//!
//! Filters are built as data and only rendered to ffmpeg's textual syntax through
//! `Display`, so tests can inspect the structure (for example the output extent of a
//! chain) without parsing strings.

use std::fmt;

use super::text::DrawText;

/// Formats a number the way filter arguments expect it: no exponent, at most three
/// decimals, trailing zeros removed.
pub fn fmt_num(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// An arithmetic expression evaluated by the engine. Anything other than a plain number
/// is single-quoted so `,` and `:` inside it survive graph and option parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr(String);

impl Expr {
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    pub fn num(value: f64) -> Self {
        Self(fmt_num(value))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.' || c == '-');
        if plain {
            f.write_str(&self.0)
        } else {
            write!(f, "'{}'", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleFit {
    /// Scale up until both sides cover the box; overflow is cropped afterwards.
    Cover,
    /// Scale down until both sides fit inside the box.
    Contain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Scale {
        width: u32,
        height: u32,
        fit: Option<ScaleFit>,
    },
    Crop {
        width: u32,
        height: u32,
        x: Expr,
        y: Expr,
    },
    /// Centers the input on a `width`x`height` canvas.
    Pad {
        width: u32,
        height: u32,
        color: String,
    },
    /// One output frame per input frame (`d=1`); `zoom`, `x` and `y` are re-evaluated
    /// for every frame.
    ZoomPan {
        zoom: Expr,
        x: Expr,
        y: Expr,
        width: u32,
        height: u32,
        fps: u32,
    },
    Rotate {
        angle: Expr,
        size: Option<(u32, u32)>,
        fill: String,
    },
    /// Linear fade over `duration` seconds from `start`; with `alpha` only the alpha
    /// channel is faded.
    Fade {
        fade_in: bool,
        start: f64,
        duration: f64,
        alpha: bool,
    },
    /// Multiplies RGB by `opacity`, i.e. composites the input over black.
    Dim(f64),
    Format(&'static str),
    SetSar,
    Overlay {
        x: Expr,
        y: Expr,
    },
    DrawText(DrawText),
    Volume(f64),
    Aresample(u32),
    Apad,
    Amix {
        inputs: u32,
        duration: &'static str,
    },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Scale { width, height, fit } => {
                write!(f, "scale={}:{}", width, height)?;
                match fit {
                    Some(ScaleFit::Cover) => f.write_str(":force_original_aspect_ratio=increase"),
                    Some(ScaleFit::Contain) => f.write_str(
                        ":force_original_aspect_ratio=decrease:force_divisible_by=2",
                    ),
                    None => Ok(()),
                }
            }
            Filter::Crop {
                width,
                height,
                x,
                y,
            } => write!(f, "crop={}:{}:{}:{}", width, height, x, y),
            Filter::Pad {
                width,
                height,
                color,
            } => write!(
                f,
                "pad={}:{}:(ow-iw)/2:(oh-ih)/2:color={}",
                width, height, color
            ),
            Filter::ZoomPan {
                zoom,
                x,
                y,
                width,
                height,
                fps,
            } => write!(
                f,
                "zoompan=z={}:x={}:y={}:d=1:s={}x{}:fps={}",
                zoom, x, y, width, height, fps
            ),
            Filter::Rotate { angle, size, fill } => {
                write!(f, "rotate=a={}", angle)?;
                if let Some((w, h)) = size {
                    write!(f, ":ow={}:oh={}", w, h)?;
                }
                write!(f, ":c={}", fill)
            }
            Filter::Fade {
                fade_in,
                start,
                duration,
                alpha,
            } => {
                write!(
                    f,
                    "fade=t={}:st={}:d={}",
                    if *fade_in { "in" } else { "out" },
                    fmt_num(*start),
                    fmt_num(*duration)
                )?;
                if *alpha {
                    f.write_str(":alpha=1")?;
                }
                Ok(())
            }
            Filter::Dim(opacity) => {
                let o = fmt_num(opacity.clamp(0.0, 1.0));
                write!(f, "colorchannelmixer=rr={o}:gg={o}:bb={o}")
            }
            Filter::Format(pix_fmt) => write!(f, "format={}", pix_fmt),
            Filter::SetSar => f.write_str("setsar=1"),
            Filter::Overlay { x, y } => write!(f, "overlay=x={}:y={}", x, y),
            Filter::DrawText(text) => write!(f, "{}", text),
            Filter::Volume(v) => write!(f, "volume={}", fmt_num(*v)),
            Filter::Aresample(rate) => write!(f, "aresample={}", rate),
            Filter::Apad => f.write_str("apad"),
            Filter::Amix { inputs, duration } => write!(
                f,
                "amix=inputs={}:duration={}:dropout_transition=0:normalize=0",
                inputs, duration
            ),
        }
    }
}

/// What is known about a chain's output frame size.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Unknown,
    AtLeast(u32, u32),
    AtMost(u32, u32),
    Exact(u32, u32),
}

#[cfg(test)]
impl Extent {
    fn then(self, filter: &Filter) -> Extent {
        match filter {
            Filter::Scale {
                width,
                height,
                fit: None,
            } => Extent::Exact(*width, *height),
            Filter::Scale {
                width,
                height,
                fit: Some(ScaleFit::Cover),
            } => Extent::AtLeast(*width, *height),
            Filter::Scale {
                width,
                height,
                fit: Some(ScaleFit::Contain),
            } => Extent::AtMost(*width, *height),
            Filter::Crop { width, height, .. }
            | Filter::Pad { width, height, .. }
            | Filter::ZoomPan { width, height, .. } => Extent::Exact(*width, *height),
            Filter::Rotate {
                size: Some((w, h)), ..
            } => Extent::Exact(*w, *h),
            _ => self,
        }
    }

    /// True when the frame can never be larger than `width`x`height`.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        match *self {
            Extent::Exact(w, h) | Extent::AtMost(w, h) => w <= width && h <= height,
            Extent::Unknown | Extent::AtLeast(..) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain(Vec<Filter>);

impl FilterChain {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn of(filters: Vec<Filter>) -> Self {
        Self(filters)
    }

    pub fn push(&mut self, filter: Filter) -> &mut Self {
        self.0.push(filter);
        self
    }

    pub fn extend(&mut self, other: FilterChain) -> &mut Self {
        self.0.extend(other.0);
        self
    }

    #[cfg(test)]
    pub fn filters(&self) -> &[Filter] {
        &self.0
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn extent(&self) -> Extent {
        self.0.iter().fold(Extent::Unknown, Extent::then)
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("null");
        }
        for (i, filter) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", filter)?;
        }
        Ok(())
    }
}

/// `[in]chain[out];...` segments joined into one `-filter_complex` argument.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    segments: Vec<(Vec<String>, FilterChain, String)>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `[inputs...]chain[output]` and returns the output label.
    pub fn chain(&mut self, inputs: &[&str], chain: FilterChain, output: &str) -> String {
        self.segments.push((
            inputs.iter().map(|s| s.to_string()).collect(),
            chain,
            output.to_string(),
        ));
        output.to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (inputs, chain, output)) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            for input in inputs {
                write!(f, "[{}]", input)?;
            }
            write!(f, "{}[{}]", chain, output)?;
        }
        Ok(())
    }
}
