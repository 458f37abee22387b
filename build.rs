fn main() {
    let now = time::OffsetDateTime::now_utc();
    let date = time::format_description::parse("[month repr:short] [day padding:space] [year]")
        .ok()
        .and_then(|fmt| now.format(&fmt).ok());
    let time = time::format_description::parse("[hour]:[minute]:[second]")
        .ok()
        .and_then(|fmt| now.format(&fmt).ok());

    let date = std::env::var("SDF_TRACER_BUILD_DATE").ok().or(date).unwrap_or_else(|| "unknown".to_string());
    let time = std::env::var("SDF_TRACER_BUILD_TIME").ok().or(time).unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=SDF_TRACER_BUILD_DATE={}", date);
    println!("cargo:rustc-env=SDF_TRACER_BUILD_TIME={}", time);
    println!("cargo:rerun-if-env-changed=SDF_TRACER_BUILD_DATE");
    println!("cargo:rerun-if-env-changed=SDF_TRACER_BUILD_TIME");
}
