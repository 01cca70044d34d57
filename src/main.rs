fn main() {
    msh::config::init_logging();

    let sigchld_flag = match msh::signals::install() {
        Ok(flag) => flag,
        Err(err) => {
            eprintln!("msh: failed to install signal handlers: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = msh::repl::run(sigchld_flag) {
        eprintln!("msh: {err}");
        std::process::exit(1);
    }
}
