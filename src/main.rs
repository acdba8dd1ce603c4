fn main() -> anyhow::Result<()> {
    postcal::cli::run()
}
