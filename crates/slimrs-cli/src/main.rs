//! Thin CLI wrapper around `slimrs` (spec §1: "file I/O for loading
//! templates from disk, the command-line entry wrapper... are external
//! collaborators, not specified here"). Reads one template file from disk,
//! parses it, and renders it with an empty `ViewModel` to stdout.

use std::cell::RefCell;
use std::env;
use std::fs;
use std::process::ExitCode;
use std::rc::Rc;

use slimrs::{Template, ViewModel};

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: slimrs <template-file>");
        return ExitCode::FAILURE;
    };

    let src = match fs::read_to_string(&path) {
        Ok(src) => src,
        Err(err) => {
            eprintln!("error reading {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let template = match Template::parse(&src, &[]) {
        Ok(t) => t,
        Err(err) => {
            eprintln!("{path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let view_model = Rc::new(RefCell::new(ViewModel::new()));
    match template.render(view_model, &[], Some(&path)) {
        Ok(html) => {
            println!("{html}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{path}: {err}");
            ExitCode::FAILURE
        }
    }
}
