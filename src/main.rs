//! TabShell, a minimal tabbed web browser shell.
//!
//! Entry point: with the `gui` feature, opens the browser window. Without it,
//! runs the shell headless: JSON actions are read from stdin one per line and
//! the resulting chrome state is printed after each.

use tabshell::{cli, logging};

#[cfg(feature = "gui")]
fn main() {
    let opts = cli::parse();
    logging::init_tracing(opts.log.as_deref());
    if let Err(e) = tabshell::ui::webview_app::run(opts) {
        eprintln!("tabshell: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "gui"))]
fn main() {
    let opts = cli::parse();
    logging::init_tracing(opts.log.as_deref());
    headless::run(opts);
}

#[cfg(not(feature = "gui"))]
mod headless {
    use std::io::{self, BufRead};
    use std::rc::Rc;

    use tabshell::action_handler::handle_ipc_message;
    use tabshell::app::{Notice, ShellController};
    use tabshell::cli::CliOptions;
    use tabshell::engine::headless::{HeadlessEngineFactory, HeadlessMode};

    pub fn run(opts: CliOptions) {
        let factory = Rc::new(HeadlessEngineFactory::untracked(HeadlessMode::Immediate));
        let mut shell = ShellController::boot(opts.shell_config(), factory);

        println!("TabShell v{} (headless)", env!("CARGO_PKG_VERSION"));
        print_state(&mut shell);

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Err(e) = handle_ipc_message(&mut shell, line) {
                eprintln!("  ! {}", e);
                continue;
            }
            print_state(&mut shell);
        }

        shell.shutdown();
        print_notices(&mut shell);
    }

    fn print_state(shell: &mut ShellController) {
        let view = shell.view();
        println!("  [{}] {}", view.chrome.status, view.chrome.window_title);
        println!("  address: {}", view.chrome.address);
        for (index, tab) in view.tabs.iter().enumerate() {
            let marker = if tab.selected { '*' } else { ' ' };
            println!("  {} {:>2}  {}  <{}>", marker, index, tab.title, tab.url);
        }
        if view.chrome.bookmarks_panel_visible {
            for (index, bookmark) in view.bookmarks.iter().enumerate() {
                println!("    bookmark {:>2}  {}  <{}>", index, bookmark.title, bookmark.url);
            }
        }
        print_notices(shell);
    }

    fn print_notices(shell: &mut ShellController) {
        for notice in shell.take_notices() {
            match notice {
                Notice::Error(message) => eprintln!("  error: {}", message),
                Notice::Info(message) => println!("  info: {}", message),
                Notice::About(about) => println!("  {} {}", about.name, about.version),
            }
        }
    }
}
