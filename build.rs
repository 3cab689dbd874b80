use clap::CommandFactory;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=crates/ciband-cli/src/lib.rs");

    // Generate manpage using clap_mangen
    let cmd = ciband_cli::Args::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buffer: Vec<u8> = Default::default();
    man.render(&mut buffer)?;

    let out_dir = PathBuf::from(env::var("OUT_DIR").map_err(io::Error::other)?);
    fs::write(out_dir.join("ciband.1"), &buffer)?;

    // In release mode, also write next to the binary (OUT_DIR is target/release/build/xxx/out)
    if env::var("PROFILE").unwrap_or_default() == "release" {
        if let Some(release_dir) = out_dir.ancestors().nth(3) {
            fs::write(release_dir.join("ciband.1"), &buffer)?;
        }
    }

    Ok(())
}
