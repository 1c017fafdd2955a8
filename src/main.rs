use lazy_proxy::{config, print::pp_value, Config, LzErr, Runtime, Term};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(config::LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let term = match Config::from_env().and_then(|config| Term::new(&config)) {
        Ok(term) => term,
        Err(e) => {
            eprintln!("Fatal Exception before REPL: {e:#}");
            return;
        }
    };
    let mut runtime = Runtime::new(term);

    loop {
        match rep(&mut runtime) {
            Ok(()) => {}
            Err(LzErr::Stop) => return,
            Err(LzErr::Fatal(e)) => {
                eprintln!("Fatal Exception: {e:#}");
                return;
            }
            Err(e) => eprintln!("Exception: {e}"),
        }
    }
}

fn rep(runtime: &mut Runtime) -> Result<(), LzErr> {
    let Some(form) = runtime.read_from_stdin()? else {
        return Ok(());
    };
    let result = runtime.eval(&form)?;
    pp_value(&result);

    Ok(())
}
