use std::path::{Path, PathBuf};
use tracing::debug;

/// Face used for any name missing from the table.
pub const DEFAULT_FONT_FILE: &str = "/usr/share/fonts/truetype/nanum/NanumGothicBold.ttf";

const NANUM_DIR: &str = "/usr/share/fonts/truetype/nanum";
const NOTO_DIR: &str = "/usr/share/fonts/opentype/noto";

enum FontRoot {
    /// Relative to the configured custom fonts directory.
    Custom,
    System(&'static str),
}

const FONT_TABLE: &[(&str, FontRoot, &str)] = &[
    ("BlackHanSans", FontRoot::Custom, "BlackHanSans-Regular.ttf"),
    ("DoHyeon", FontRoot::Custom, "DoHyeon-Regular.ttf"),
    ("Jua", FontRoot::Custom, "Jua-Regular.ttf"),
    ("Gaegu", FontRoot::Custom, "Gaegu-Regular.ttf"),
    ("GaeguBold", FontRoot::Custom, "Gaegu-Bold.ttf"),
    ("CuteFont", FontRoot::Custom, "CuteFont-Regular.ttf"),
    ("KirangHaerang", FontRoot::Custom, "KirangHaerang-Regular.ttf"),
    ("GamjaFlower", FontRoot::Custom, "GamjaFlower-Regular.ttf"),
    ("YeonSung", FontRoot::Custom, "YeonSung-Regular.ttf"),
    ("Stylish", FontRoot::Custom, "Stylish-Regular.ttf"),
    ("Sunflower", FontRoot::Custom, "Sunflower-Light.ttf"),
    ("SunflowerMedium", FontRoot::Custom, "Sunflower-Medium.ttf"),
    ("SunflowerBold", FontRoot::Custom, "Sunflower-Bold.ttf"),
    ("NanumGothicBold", FontRoot::System(NANUM_DIR), "NanumGothicBold.ttf"),
    ("NanumGothic", FontRoot::System(NANUM_DIR), "NanumGothic.ttf"),
    ("NanumBarunGothicBold", FontRoot::System(NANUM_DIR), "NanumBarunGothicBold.ttf"),
    ("NanumBarunGothic", FontRoot::System(NANUM_DIR), "NanumBarunGothic.ttf"),
    ("NanumMyeongjoBold", FontRoot::System(NANUM_DIR), "NanumMyeongjoBold.ttf"),
    ("NanumMyeongjo", FontRoot::System(NANUM_DIR), "NanumMyeongjo.ttf"),
    ("NanumSquare", FontRoot::System(NANUM_DIR), "NanumSquareR.ttf"),
    ("NanumSquareB", FontRoot::System(NANUM_DIR), "NanumSquareB.ttf"),
    ("NanumSquareRound", FontRoot::System(NANUM_DIR), "NanumSquareRoundR.ttf"),
    ("Noto Sans KR", FontRoot::System(NOTO_DIR), "NotoSansCJK-Regular.ttc"),
    ("Noto Sans KR Bold", FontRoot::System(NOTO_DIR), "NotoSansCJK-Bold.ttc"),
    ("Noto Sans KR Medium", FontRoot::System(NOTO_DIR), "NotoSansCJK-Medium.ttc"),
    ("Noto Sans KR Black", FontRoot::System(NOTO_DIR), "NotoSansCJK-Black.ttc"),
    ("Noto Serif KR", FontRoot::System(NOTO_DIR), "NotoSerifCJK-Regular.ttc"),
];

/// Maps logical font names to font files. Lookups never fail: unknown names resolve to
/// [`DEFAULT_FONT_FILE`].
#[derive(Debug, Clone)]
pub struct FontCatalog {
    custom_dir: PathBuf,
}

impl FontCatalog {
    pub fn new(custom_dir: impl AsRef<Path>) -> Self {
        Self {
            custom_dir: custom_dir.as_ref().to_path_buf(),
        }
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        let entry = FONT_TABLE
            .iter()
            .find(|(logical, _, _)| logical.eq_ignore_ascii_case(name.trim()));

        match entry {
            Some((_, FontRoot::Custom, file)) => self.custom_dir.join(file),
            Some((_, FontRoot::System(dir), file)) => Path::new(dir).join(file),
            None => {
                debug!("Font '{}' not registered, using default face", name);
                PathBuf::from(DEFAULT_FONT_FILE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_system_and_custom_fonts_resolve() {
        let catalog = FontCatalog::new("/srv/fonts");
        assert_eq!(
            catalog.resolve("NanumSquareB"),
            PathBuf::from("/usr/share/fonts/truetype/nanum/NanumSquareB.ttf")
        );
        assert_eq!(
            catalog.resolve("Jua"),
            PathBuf::from("/srv/fonts/Jua-Regular.ttf")
        );
        assert_eq!(
            catalog.resolve("noto sans kr bold"),
            PathBuf::from("/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc")
        );
    }

    #[test]
    fn unknown_names_fall_back_to_default_face() {
        let catalog = FontCatalog::new("fonts");
        for name in ["", "Comic Sans", "../../etc/passwd", "NanumGothicBoldX"] {
            assert_eq!(catalog.resolve(name), PathBuf::from(DEFAULT_FONT_FILE));
        }
    }
}
