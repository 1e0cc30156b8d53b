use indicatif::ProgressStyle;

pub fn recognition_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:<10} {bar:40.cyan/blue} {percent:>3}% [{elapsed_precise}]",
    )
    .expect("invalid recognition bar template")
}
