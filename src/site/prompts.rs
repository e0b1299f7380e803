//! Prompt for the first build of a freshly created site.

use std::sync::LazyLock;

use regex::Regex;

/// Same pattern the CI workflow uses to pick URLs out of a prompt before
/// scraping them into `reference/`.
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).unwrap());

/// URLs mentioned in `text`, in order of appearance.
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_REGEX.find_iter(text).map(|m| m.as_str()).collect()
}

/// Build the structured prompt that turns the starter template into a
/// complete site. The user's description is embedded verbatim.
pub fn initial_build_prompt(display_name: &str, description: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Build out the website \"{}\" from the starter template in this repository.\n\n",
        display_name
    ));
    prompt.push_str("## What the owner asked for\n\n");
    prompt.push_str(description.trim());
    prompt.push_str("\n\n");

    let urls = extract_urls(description);
    if !urls.is_empty() {
        prompt.push_str("## Reference content\n\n");
        prompt.push_str(
            "The description links to existing pages. They have been scraped into the \
             reference/ directory before you started:\n",
        );
        for url in &urls {
            prompt.push_str(&format!("- {}\n", url));
        }
        prompt.push_str(
            "\nRead every HTML file in reference/ and carry over ALL real content: \
             headings, copy, contact details, opening hours, prices and testimonials. \
             Copy useful images from reference/ into images/. Never invent content \
             that the reference already provides.\n\n",
        );
    }

    prompt.push_str("## Requirements\n\n");
    prompt.push_str(
        "1. Replace every placeholder in index.html. No lorem ipsum, no \"Coming soon\".\n\
         2. Keep it a static site: HTML, Tailwind CSS via CDN and vanilla JavaScript only.\n\
         3. Mobile first. Every section must work from 375px wide upward.\n\
         4. Include a navigation bar, a hero section, the sections the description calls for, \
         and a footer.\n\
         5. Add separate pages only when the content needs them, and link them from the navigation.\n\
         6. Update the <title> and meta description to match the site.\n\
         7. Follow CLAUDE.md for style and structure conventions.\n\n",
    );
    prompt.push_str("Commit the finished site when done. Do not commit the reference/ directory.\n");

    prompt
}
