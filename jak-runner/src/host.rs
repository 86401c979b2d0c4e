//! Built-ins that talk to the host: console, process and file system. Also
//! the loader that resolves `use` paths against the file system.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};

use gc::Gc;
use jak_interpreter::builtins::{check_arity, expect_integer, expect_string, wrong_type};
use jak_interpreter::object::FileHandle;
use jak_interpreter::{Builtins, ErrorKind, EvaluationError, Location, Object, SourceLoader};

/// Reads imported files relative to the working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// The standard built-ins plus the host ones.
pub fn builtins() -> Builtins {
    let mut builtins = Builtins::standard();
    builtins
        .register("print", print)
        .register("println", println)
        .register("input", input)
        .register("exit", exit)
        .register("open", open)
        .register("close", close)
        .register("read", read)
        .register("readlines", readlines)
        .register("write", write)
        .register("mkdir", mkdir)
        .register("rmdir", rmdir)
        .register("mkfile", mkfile)
        .register("rmfile", rmfile);
    builtins
}

fn io_error(location: &Location, message: String) -> EvaluationError {
    location.error(ErrorKind::Io(message))
}

fn stdout_error(location: &Location, err: io::Error) -> EvaluationError {
    io_error(location, format!("could not write to stdout: {}", err))
}

/// Prints the arguments back to back, then a newline.
fn print(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    let mut stdout = io::stdout().lock();
    for (i, arg) in args.iter().enumerate() {
        if i == args.len() - 1 {
            writeln!(stdout, "{}", arg)
        } else {
            write!(stdout, "{}", arg)
        }
        .map_err(|err| stdout_error(location, err))?;
    }
    Ok(Object::null())
}

/// Prints every argument on its own line.
fn println(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    let mut stdout = io::stdout().lock();
    for arg in &args {
        writeln!(stdout, "{}", arg).map_err(|err| stdout_error(location, err))?;
    }
    Ok(Object::null())
}

fn input(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", args[0])
            .and_then(|_| stdout.flush())
            .map_err(|err| stdout_error(location, err))?;
    }

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|err| io_error(location, format!("could not read from stdin: {}", err)))?;
    let trimmed = line.trim_end_matches(['\n', '\r']);
    Ok(Object::string(trimmed))
}

fn exit(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let code = expect_integer(location, "exit", &args[0])?;
    let _ = io::stdout().flush();
    std::process::exit(code as i32)
}

/// Modes: `r`, `w` (truncates), `a`, `rw` and `ra`. The last four create the
/// file when it is missing.
fn open(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let path = expect_string(location, "open", &args[0])?;
    let mode = expect_string(location, "open", &args[1])?;

    let mut options = OpenOptions::new();
    match mode {
        "r" => options.read(true),
        "w" => options.write(true).create(true).truncate(true),
        "a" => options.append(true).create(true),
        "rw" => options.read(true).write(true).create(true),
        "ra" => options.read(true).append(true).create(true),
        _ => return Err(io_error(location, format!("invalid mode {}", mode))),
    };

    let file = options
        .open(path)
        .map_err(|err| io_error(location, format!("could not open file {}: {}", path, err)))?;
    Ok(Object::file(path, file))
}

fn expect_file<'a>(
    location: &Location,
    name: &str,
    object: &'a Object,
) -> Result<&'a FileHandle, EvaluationError> {
    match object {
        Object::File(handle) => Ok(handle),
        other => Err(wrong_type(location, name, "FILE", other)),
    }
}

fn with_open_file<T>(
    location: &Location,
    handle: &FileHandle,
    action: impl FnOnce(&mut File) -> io::Result<T>,
    failure: &str,
) -> Result<T, EvaluationError> {
    let mut file = handle.file.borrow_mut();
    let Some(file) = file.as_mut() else {
        return Err(io_error(location, format!("file {} is closed", handle.path)));
    };
    action(file).map_err(|err| io_error(location, format!("{} {}: {}", failure, handle.path, err)))
}

fn close(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let handle = expect_file(location, "close", &args[0])?;
    match handle.file.borrow_mut().take() {
        Some(file) => {
            file.sync_all().map_err(|err| {
                io_error(location, format!("could not close file {}: {}", handle.path, err))
            })?;
            Ok(Object::null())
        }
        None => Err(io_error(location, format!("file {} is already closed", handle.path))),
    }
}

fn read_all(location: &Location, handle: &FileHandle) -> Result<String, EvaluationError> {
    with_open_file(
        location,
        handle,
        |file| {
            let mut content = String::new();
            file.read_to_string(&mut content)?;
            Ok(content)
        },
        "could not read file",
    )
}

fn read(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let handle = expect_file(location, "read", &args[0])?;
    Ok(Object::string(read_all(location, handle)?))
}

/// Splits the remaining content on `\n`; a trailing newline yields a final
/// empty string.
fn readlines(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let handle = expect_file(location, "readlines", &args[0])?;
    let content = read_all(location, handle)?;
    Ok(Object::array(content.split('\n').map(Object::string).collect()))
}

fn write(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 2)?;
    let handle = expect_file(location, "write", &args[0])?;
    let content = expect_string(location, "write", &args[1])?;
    with_open_file(
        location,
        handle,
        |file| file.write_all(content.as_bytes()),
        "could not write to file",
    )?;
    Ok(Object::null())
}

fn path_operation(
    location: &Location,
    args: Vec<Gc<Object>>,
    name: &str,
    operation: fn(&str) -> io::Result<()>,
    failure: &str,
) -> Result<Gc<Object>, EvaluationError> {
    check_arity(location, &args, 1)?;
    let path = expect_string(location, name, &args[0])?;
    operation(path).map_err(|err| io_error(location, format!("{} {}: {}", failure, path, err)))?;
    Ok(Object::null())
}

fn mkdir(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    path_operation(location, args, "mkdir", |path: &str| fs::create_dir(path), "could not create directory")
}

fn rmdir(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    path_operation(location, args, "rmdir", |path: &str| fs::remove_dir(path), "could not remove directory")
}

fn mkfile(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    path_operation(
        location,
        args,
        "mkfile",
        |path: &str| File::create(path).map(drop),
        "could not create file",
    )
}

fn rmfile(location: &Location, args: Vec<Gc<Object>>) -> Result<Gc<Object>, EvaluationError> {
    path_operation(location, args, "rmfile", |path: &str| fs::remove_file(path), "could not remove file")
}
