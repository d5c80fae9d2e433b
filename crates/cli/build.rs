use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("docsan")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Docsan Contributors")
        .about("Sanitize HTML documents into JSON document records")
        .arg(clap::arg!(<INPUT> "Local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, html)")
                .value_name("FORMAT")
                .default_value("json")
                .value_parser(["json", "html"]),
        )
        .arg(
            clap::arg!(--meta <NAME> "Meta name to keep in the record (repeatable)")
                .value_name("NAME")
                .action(clap::ArgAction::Append),
        )
        .arg(clap::arg!(--generated <TAG> "Generator tag written to the record").value_name("TAG"))
        .arg(clap::arg!(--pretty "Indent JSON output"))
        .arg(clap::arg!(-v --verbose "Print progress to stderr"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "docsan", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "docsan", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "docsan", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "docsan", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
