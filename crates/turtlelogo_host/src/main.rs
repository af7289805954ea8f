use std::{
    fs::File,
    io::{BufRead as _, BufReader},
    path::PathBuf,
    rc::Rc,
};

use anyhow::Context as _;
use clap::Parser;
use turtlelogo::{Interpreter, Recorder};
use turtlelogo_host::{render_svg, shared_input, HostCanvas};

#[derive(Parser, Debug)]
struct Args {
    /// Read the program from this file instead of from standard input.
    input: Option<PathBuf>,

    /// Save the drawing here once the program is done.
    #[clap(long)]
    svg: Option<PathBuf>,

    /// Width and height of the saved drawing.
    #[clap(long, default_value_t = 500)]
    size: u32,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    // Prompts always come from stdin; the program comes from stdin too, unless there's a file.
    let stdin = shared_input(BufReader::new(std::io::stdin()));
    let program = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open input file {}", path.display()))?;
            shared_input(BufReader::new(file))
        }
        None => Rc::clone(&stdin),
    };

    let recorder = Recorder::default();
    let mut interp = Interpreter::new(HostCanvas::new(recorder.clone(), stdin));

    let mut line = String::new();
    loop {
        line.clear();
        if program.borrow_mut().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim() == "exit" {
            break;
        }

        let (log, errors) = interp.submit(&line);
        print!("{log}");
        eprint!("{errors}");
    }

    if let Some(path) = &args.svg {
        let doc = render_svg(&recorder.ops(), args.size);
        svg::save(path, &doc)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("saved drawing to {}", path.display());
    }
    Ok(())
}
