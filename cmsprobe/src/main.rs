use cmsprobe::commands::command_argument_builder;
use cmsprobe::handlers::{handle_lookup, init_logging};

// Lookups are strictly sequential, so one thread is all the runtime needs
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = command_argument_builder().get_matches();

    init_logging(matches.get_flag("verbose"));

    handle_lookup(&matches).await;
}
