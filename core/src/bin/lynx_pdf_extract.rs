use dividata::cli::extract::run;

fn main() -> anyhow::Result<()> {
    run()
}
