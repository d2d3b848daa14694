// serialmon - Serial monitor for microcontroller consoles
use clap::Parser;
use serialmon::cli::{execute_command, Args};
use serialmon::SerialMonError;

#[tokio::main]
async fn main() -> Result<(), SerialMonError> {
    let args = Args::parse();

    match execute_command(args).await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
