fn main() -> anyhow::Result<()> {
    apkrename::run()
}
