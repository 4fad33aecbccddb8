pub mod analyzer;
pub mod environment;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod utils;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use utf8_chars::BufReadCharsExt;

use crate::{
    analyzer::prelude::{ModuleInferencer, Outcome},
    environment::prelude::Environment,
    eval::{builtins, eval_module, Evaluated, FsImportLoader, ImportLoader},
    parser::prelude::{parse_module, parse_module_from_stream, Module, Parsed},
    utils::prelude::{
        Error, RuntimeWarningEmitter, TypeWarningEmitter, WarningEmitter, WarningEmitterIO,
    },
};

fn module_name(path: &PathBuf) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse and statically check a module; the inference pass runs here and
/// its warnings flow to the emitter.
pub fn check_source(
    path: PathBuf,
    src: &str,
    warnings: Rc<dyn WarningEmitterIO>,
) -> Result<Module, Error> {
    let warnings = WarningEmitter::new(warnings);

    let Parsed { mut module, .. } = match parse_module(src) {
        Ok(parsed) => parsed,
        Err(error) => {
            return Err(Error::Parse { path, src: src.into(), error });
        }
    };
    module.name = module_name(&path);

    let type_warnings = TypeWarningEmitter::new(
        path.clone(),
        src.to_string(),
        warnings
    );

    match ModuleInferencer::infer(module, &type_warnings) {
        Outcome::Ok(module) => Ok(module),
        Outcome::PartialFailure(_, errors) => {
            Err(Error::Type { path, src: src.into(), errors })
        }
    }
}

/// The whole pipeline over in-memory source: parse, infer, evaluate.
/// Warnings from both passes stream through `warnings`; the first fatal
/// problem comes back as one consolidated `Error`.
pub fn run_source(
    path: PathBuf,
    src: &str,
    warnings: Rc<dyn WarningEmitterIO>,
    loader: &dyn ImportLoader,
) -> Result<Evaluated, Error> {
    let module = check_source(path.clone(), src, Rc::clone(&warnings))?;

    let runtime_warnings = RuntimeWarningEmitter::new(
        path.clone(),
        src.to_string(),
        WarningEmitter::new(warnings)
    );

    let env = builtins::global_environment();

    eval_module(&module, &env, &runtime_warnings, loader)
        .map_err(|error| Error::Runtime { path, src: src.into(), error })
}

/// Run a program from disk; `import` paths resolve next to the file.
pub fn run(path: PathBuf, warnings: Rc<dyn WarningEmitterIO>) -> Result<Evaluated, Error> {
    let src = match std::fs::read_to_string(&path) {
        Ok(src) => src,
        Err(err) => return Err(Error::StdIo { err: err.kind() }),
    };

    let loader = FsImportLoader {
        root: path.parent().map(PathBuf::from).unwrap_or_default(),
    };

    run_source(path, &src, warnings, &loader)
}

/// Like `run`, but lexing straight off a buffered reader instead of a
/// preloaded string. The source accumulates alongside for diagnostics.
pub fn run_from_stream(
    path: PathBuf,
    warnings: Rc<dyn WarningEmitterIO>,
) -> Result<Evaluated, Error> {
    let warning_emitter = WarningEmitter::new(Rc::clone(&warnings));

    let file = match std::fs::File::open(&path) {
        Ok(file) => file,
        Err(err) => return Err(Error::StdIo { err: err.kind() }),
    };

    let file_size = file.metadata()
        .map_err(|err| Error::StdIo { err: err.kind() })?.len() as usize;

    let src = Rc::new(RefCell::new(String::with_capacity(file_size)));
    let sink = Rc::clone(&src);

    let mut reader = std::io::BufReader::new(file);
    let stream = reader.chars()
        .take_while(|c| c.is_ok())
        .map(move |c| {
            let c = c.expect("checked by take_while");
            sink.borrow_mut().push(c);
            c
        });

    let parsed = parse_module_from_stream(stream);
    let src = Rc::try_unwrap(src)
        .expect("stream closure dropped with the stream")
        .into_inner();

    let Parsed { mut module, .. } = match parsed {
        Ok(parsed) => parsed,
        Err(error) => {
            return Err(Error::Parse { path, src, error });
        }
    };
    module.name = module_name(&path);

    let type_warnings = TypeWarningEmitter::new(
        path.clone(),
        src.clone(),
        warning_emitter
    );

    let module = match ModuleInferencer::infer(module, &type_warnings) {
        Outcome::Ok(module) => module,
        Outcome::PartialFailure(_, errors) => {
            return Err(Error::Type { path, src, errors });
        }
    };

    let runtime_warnings = RuntimeWarningEmitter::new(
        path.clone(),
        src.clone(),
        WarningEmitter::new(warnings)
    );

    let loader = FsImportLoader {
        root: path.parent().map(PathBuf::from).unwrap_or_default(),
    };

    let env = builtins::global_environment();

    eval_module(&module, &env, &runtime_warnings, &loader)
        .map_err(|error| Error::Runtime { path, src, error })
}
