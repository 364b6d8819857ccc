use node_voice::cli::{self, Invocation};
use node_voice::config::SynthesizerConfig;
use node_voice::engines::kokoro::KokoroEngine;
use node_voice::Error;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let invocation = match Invocation::from_args(std::env::args()) {
        Ok(invocation) => invocation,
        Err(usage @ Error::Usage(_)) => {
            println!("{usage}");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let config = SynthesizerConfig::default();
    let mut engine = KokoroEngine::new();
    let path = node_voice::run(&invocation, &config, &mut engine)?;

    println!("{}", cli::confirmation(&path));
    Ok(())
}
