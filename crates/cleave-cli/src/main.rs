fn main() -> Result<(), Box<dyn std::error::Error>> {
    cleave_cli::runner::main(std::env::args().collect())
}
