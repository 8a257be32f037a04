use anyhow::Result;
use minsh::Shell;

fn main() -> Result<()> {
    Shell::new()?.repl()
}
