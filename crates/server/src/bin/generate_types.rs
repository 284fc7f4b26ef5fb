use std::{env, fs, path::PathBuf};

use db::models::{
    form_blueprint::{BlueprintStatus, FormHead},
    form_entry::FormEntryStatus,
    role_membership::Role,
};
use server::{
    error::ErrorBody,
    routes::forms::{
        DeleteFormRequest, DeleteFormResponse, SaveFormRequest, SaveFormResponse,
        StartFormResponse, SubmitFormResponse,
    },
};
use services::services::{
    form_lifecycle::{FormEntryView, StartFormEntry},
    visibility::{Capabilities, Feature},
};
use ts_rs::TS;

const HEADER: &str = "// This file was generated by `crates/server/src/bin/generate_types.rs`.\n\n\
// Do not edit this file manually.";

fn generate_types_content() -> String {
    let decls = [
        FormEntryStatus::decl(),
        FormHead::decl(),
        BlueprintStatus::decl(),
        Role::decl(),
        Feature::decl(),
        Capabilities::decl(),
        FormEntryView::decl(),
        StartFormEntry::decl(),
        StartFormResponse::decl(),
        SaveFormRequest::decl(),
        SaveFormResponse::decl(),
        SubmitFormResponse::decl(),
        DeleteFormRequest::decl(),
        DeleteFormResponse::decl(),
        ErrorBody::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| {
            let trimmed = d.trim_start();
            if trimmed.starts_with("export") {
                d
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{HEADER}\n\n{body}\n")
}

fn main() {
    let check_mode = env::args().any(|arg| arg == "--check");
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared/types.ts");
    let generated = generate_types_content();

    if check_mode {
        match fs::read_to_string(&path) {
            Ok(current) if current == generated => {
                println!("✅ shared/types.ts is up to date.");
            }
            _ => {
                eprintln!("❌ shared/types.ts is not up to date. Please run 'cargo run --bin generate_types' and commit the changes.");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("cannot create shared/");
    }
    fs::write(&path, generated).expect("unable to write types.ts");
    println!("✅ TypeScript types generated in shared/types.ts");
}
