//! Shell completions and man pages.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::Shell;
use clap_mangen::Man;

use crate::Cli;

const BIN_NAME: &str = "rankings";

/// Write the completion script for `shell`.
fn write_completions(shell: Shell, out: &mut impl Write) {
    clap_complete::generate(shell, &mut Cli::command(), BIN_NAME, out);
}

/// Write `rankings.1` plus one `rankings-<subcommand>.1` per visible subcommand.
fn write_man_pages(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut cmd = Cli::command();
    cmd.build();

    let mut pages = Vec::new();
    let mut render = |man: Man, file: String| -> std::io::Result<()> {
        let path = dir.join(file);
        let mut buf = Vec::new();
        man.render(&mut buf)?;
        std::fs::write(&path, buf)?;
        pages.push(path);
        Ok(())
    };

    for sub in cmd.get_subcommands() {
        if sub.is_hide_set() || sub.get_name() == "help" {
            continue;
        }
        let name = format!("{BIN_NAME}-{}", sub.get_name());
        render(Man::new(sub.clone()).title(name.clone()), format!("{name}.1"))?;
    }
    render(Man::new(cmd), format!("{BIN_NAME}.1"))?;

    Ok(pages)
}

pub(crate) fn handle_completions(shell: Shell) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();
    write_completions(shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

pub(crate) fn handle_man(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(dir) => {
            for page in write_man_pages(&dir)? {
                println!("{}", page.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            Man::new(Cli::command()).render(&mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
