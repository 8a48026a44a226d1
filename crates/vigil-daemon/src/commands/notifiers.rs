// notifiers.rs - `vigil notifiers`: list the built-in back ends.

use vigil_notify::Catalog;

pub fn execute() -> anyhow::Result<()> {
    let catalog = Catalog::builtin();
    println!("Available notifiers:");
    for spec in catalog.specs() {
        println!("  {:<8} {}", spec.name, spec.description);
    }
    Ok(())
}
