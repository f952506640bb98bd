pub mod logger;

/// Turns a page URL into a file-name friendly stem
pub fn url_to_snake_case(url: &str) -> String {
    let mut s = url.to_lowercase();
    s = s.replace("https", "");
    s = s.replace("http", "");
    s = s.replace("://", "");
    s = s.replace(|c: char| !c.is_ascii_alphanumeric(), "_");
    while s.contains("__") {
        s = s.replace("__", "_");
    }
    s.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_to_snake_case() {
        assert_eq!(url_to_snake_case("https://www.Example.com/about-us/"), "www_example_com_about_us");
        assert_eq!(url_to_snake_case("http://localhost:8080/?q=1"), "localhost_8080_q_1");
    }
}
