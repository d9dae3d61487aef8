use std::{env, fs, path::PathBuf};

fn input_arg() -> clap::Arg {
    clap::arg!(<INPUT> "File to read, or '-' for stdin")
}

fn output_arg() -> clap::Arg {
    clap::arg!(-o --output <FILE> "Output file (default: stdout)")
        .value_name("FILE")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

fn layout_arg() -> clap::Arg {
    clap::arg!(-l --layout <LAYOUT> "Layout (interstitial, advertorial, or generic)").value_name("LAYOUT")
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("pagecraft")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Pagecraft Contributors")
        .about("Fetch, clean, rewrite and format web pages")
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(
            clap::Command::new("extract")
                .about("Fetch a URL (or read an HTML file / stdin) and print its cleaned text")
                .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
                .arg(clap::arg!(--json "Print the full extraction record as JSON"))
                .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds (default: PAGECRAFT_FETCH_TIMEOUT or 20)"))
                .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
                .arg(output_arg()),
        )
        .subcommand(
            clap::Command::new("reclean")
                .about("Re-clean previously extracted text without refetching")
                .arg(input_arg())
                .arg(output_arg()),
        )
        .subcommand(
            clap::Command::new("generate")
                .about("Rewrite cleaned text into a layout")
                .arg(layout_arg())
                .arg(input_arg())
                .arg(clap::arg!(--html "Print the formatted HTML table instead of markdown"))
                .arg(clap::arg!(--json "Print the full generation record as JSON"))
                .arg(output_arg()),
        )
        .subcommand(
            clap::Command::new("format")
                .about("Render generated markdown as an HTML table")
                .arg(layout_arg())
                .arg(
                    clap::arg!(--prompt_version <VERSION> "Prompt version the markdown was generated with")
                        .value_parser(["v1", "v2-interstitial-structured"]),
                )
                .arg(input_arg())
                .arg(output_arg()),
        )
        .subcommand(
            clap::Command::new("batch")
                .about("Re-process a JSON array of page records")
                .arg(
                    clap::arg!(<RECORDS> "JSON file with page records")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(clap::arg!(--refetch "Re-download every page before cleaning"))
                .arg(clap::arg!(--generate <LAYOUT> "Generate this layout for every record"))
                .arg(clap::arg!(--workers <NUM> "Concurrent workers"))
                .arg(output_arg()),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "pagecraft", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "pagecraft", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "pagecraft", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "pagecraft", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
