use num_format::{Locale, ToFormattedString};
use owo_colors::{OwoColorize, Style};

pub fn format_count(count: usize) -> String {
    count.to_formatted_string(&Locale::en)
}

pub fn print_heading(text: &str) {
    let heading_style = Style::new().bold();
    println!("{}", format!("=== {} ===", text).style(heading_style));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(7), "7");
        assert_eq!(format_count(12345), "12,345");
    }
}
