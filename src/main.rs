fn main() -> anyhow::Result<()> {
    newborn_danger_lib::cli::run()
}
