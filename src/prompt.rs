//! Minimal prompt rendering: `<user>@msh: <cwd> $> `, with the working
//! directory shortened to `~<tail>` under `$HOME`.

use std::env;
use std::path::Path;

pub fn render(cwd: &Path) -> String {
    let user = env::var("USER").unwrap_or_else(|_| "user".to_string());
    let cwd_display = shorten_to_home(cwd);
    format!("{user}@msh: {cwd_display} $> ")
}

fn shorten_to_home(cwd: &Path) -> String {
    if let Ok(home) = env::var("HOME") {
        let home = Path::new(&home);
        if let Ok(tail) = cwd.strip_prefix(home) {
            return if tail.as_os_str().is_empty() {
                "~".to_string()
            } else {
                format!("~/{}", tail.display())
            };
        }
    }
    cwd.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn shortens_paths_under_home() {
        unsafe {
            env::set_var("HOME", "/home/tester");
        }
        assert_eq!(shorten_to_home(&PathBuf::from("/home/tester/proj")), "~/proj");
        assert_eq!(shorten_to_home(&PathBuf::from("/home/tester")), "~");
    }

    #[test]
    fn leaves_paths_outside_home_untouched() {
        unsafe {
            env::set_var("HOME", "/home/tester");
        }
        assert_eq!(shorten_to_home(&PathBuf::from("/var/log")), "/var/log");
    }
}
