use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Cargo 빌드 단계에서 egui가 사용할 한글 폰트 스텁을 준비한다.
fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    generate_font_stub()
}

/// 사용 가능한 한글 폰트를 탐색하여 egui에서 include_bytes! 할 수 있는 스텁을 만든다.
fn generate_font_stub() -> std::io::Result<()> {
    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| std::io::Error::other("OUT_DIR이 설정되지 않았습니다."))?;
    let dest = out_dir.join("custom_font.rs");
    if let Some(path) = locate_font_file() {
        let escaped = path.to_string_lossy().replace('\\', "\\\\");
        let content = format!(
            "pub fn embedded_font_bytes() -> Option<&'static [u8]> {{\n    Some(include_bytes!(\"{escaped}\"))\n}}\n"
        );
        fs::write(dest, content)?;
    } else {
        fs::write(
            dest,
            "pub fn embedded_font_bytes() -> Option<&'static [u8]> { None }\n",
        )?;
    }
    Ok(())
}

/// 한글 폰트 파일을 찾는다. `STEPGATE_FONT`가 있으면 그 경로를 우선한다.
fn locate_font_file() -> Option<PathBuf> {
    println!("cargo:rerun-if-env-changed=STEPGATE_FONT");
    if let Some(explicit) = env::var_os("STEPGATE_FONT").map(PathBuf::from) {
        if explicit.is_file() {
            return Some(explicit);
        }
        println!(
            "cargo:warning=STEPGATE_FONT 경로를 찾을 수 없습니다: {}",
            explicit.display()
        );
    }

    let found = font_dirs()
        .into_iter()
        .filter(|dir| dir.exists())
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(Result::ok))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| is_korean_font(path));
    match &found {
        Some(path) => println!("cargo:rerun-if-changed={}", path.display()),
        None => println!("cargo:warning=한글 폰트를 찾지 못했습니다. 기본 폰트가 사용됩니다."),
    }
    found
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/Library/Fonts"),
    ];
    if let Some(home) = env::var_os("HOME") {
        dirs.push(Path::new(&home).join(".fonts"));
        dirs.push(Path::new(&home).join(".local/share/fonts"));
    }
    if let Some(windir) = env::var_os("WINDIR") {
        dirs.push(Path::new(&windir).join("Fonts"));
    }
    dirs
}

fn is_korean_font(path: &Path) -> bool {
    const KEYWORDS: [&str; 5] = ["nanum", "noto", "malgun", "applegothic", "pretendard"];
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    KEYWORDS.iter().any(|k| name.contains(k)) && matches!(ext.as_str(), "ttf" | "otf" | "ttc")
}
