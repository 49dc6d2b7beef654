use std::env;
use std::io::{self, BufRead, Write};

use color_eyre::eyre::{eyre, Result, WrapErr};
use simple_logger::SimpleLogger;

use micro16::memory::load;
use micro16::{Config, Processor};

/// Program path from the first argument, or asked for on stdin
fn program_path() -> Result<String> {
    if let Some(path) = env::args().nth(1) {
        return Ok(path);
    }

    print!("Type in the path to the rom file: ");
    io::stdout().flush()?;

    let mut path = String::new();
    io::stdin()
        .lock()
        .read_line(&mut path)
        .wrap_err("Failed to read the program path")?;

    let path = path.trim();
    if path.is_empty() {
        return Err(eyre!("No program path given"));
    }
    Ok(path.to_string())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::default();
    SimpleLogger::new()
        .with_level(config.log_level)
        .init()
        .map_err(|err| eyre!("Failed to set up logging: {}", err))?;

    let path = program_path()?;
    let program = load::read_program(&path)?;

    let mut cpu = Processor::default();
    cpu.load_program(&program);
    cpu.rom.dump(0, 16);

    let halt = cpu.run(&config)?;
    log::debug!("{} finished: {}", path, halt);

    Ok(())
}
