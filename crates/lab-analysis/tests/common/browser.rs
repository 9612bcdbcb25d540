//! Browser availability helpers

use lab_analysis::config::BrowserSettings;
use lab_analysis::ChromiumLauncher;

/// Check if browser tests should be skipped (when Chrome isn't available)
pub fn should_skip() -> bool {
    std::env::var("SKIP_BROWSER_TESTS").is_ok()
}

/// Macro to skip test if Chrome isn't available
#[macro_export]
macro_rules! skip_if_no_chrome {
    () => {
        if browser::should_skip() {
            eprintln!("Skipping test: SKIP_BROWSER_TESTS is set");
            return;
        }
    };
}

/// Find Chrome for Testing installed by Puppeteer
pub fn find_chrome_for_testing() -> Option<std::path::PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let cache = std::path::Path::new(&home).join(".cache/puppeteer/chrome");

    let mut versions: Vec<_> = std::fs::read_dir(&cache)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    versions.sort_by(|a, b| b.cmp(a));

    versions.into_iter().find_map(|dir| {
        [
            "chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
            "chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
            "chrome-linux64/chrome",
        ]
        .iter()
        .map(|rel| dir.join(rel))
        .find(|p| p.exists())
    })
}

/// Launcher that prefers Chrome for Testing when present
pub fn test_launcher() -> ChromiumLauncher {
    let settings = BrowserSettings {
        chrome_executable: find_chrome_for_testing(),
        ..BrowserSettings::default()
    };
    ChromiumLauncher::new(settings)
}
