use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    weai::cli::main()
}
