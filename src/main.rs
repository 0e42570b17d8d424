use anyhow::Context;

fn main() -> anyhow::Result<()> {
    gradebook::run().context("gradebook failed")
}
