// Renders `redback.1` plus one page per subcommand (`redback-energy.1`,
// `redback-config-init.1`, ...) into $OUT_DIR/man for packagers.

use std::fs;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

// The argument definitions only need clap, clap_complete and humantime.
#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("create man directory");

    let mut pending = vec![cli::Cli::command()];
    while let Some(cmd) = pending.pop() {
        let page = cmd.get_name().to_owned();
        write_page(&cmd, &man_dir.join(format!("{page}.1")));

        pending.extend(
            cmd.get_subcommands()
                .filter(|sub| !sub.is_hide_set())
                .map(|sub| sub.clone().name(format!("{page}-{}", sub.get_name()))),
        );
    }
}

fn write_page(cmd: &clap::Command, path: &Path) {
    let mut roff = Vec::new();
    if let Err(e) = clap_mangen::Man::new(cmd.clone()).render(&mut roff) {
        panic!("render {}: {e}", path.display());
    }
    if let Err(e) = fs::write(path, roff) {
        panic!("write {}: {e}", path.display());
    }
}
