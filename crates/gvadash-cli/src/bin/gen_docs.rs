//! Emits the command-line options as markdown on stdout.

fn main() {
    print!("{}", gvadash_cli::render_options_markdown());
}
