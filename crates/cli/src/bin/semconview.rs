use anyhow::Result;

fn main() -> Result<()> {
    semconview_cli::main_entry()
}
