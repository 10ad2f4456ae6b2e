//! Cleaning user content with a Rails-style policy.
//!
//! This demo builds the policy a typical web application configures:
//! 1. A short list of block and inline elements
//! 2. Inline styles limited to alignment and background colour
//! 3. Links forced to `rel="nofollow"` and `target="_blank"`
//! 4. Legacy markup (`<div>`, `<font>`, `align=`) rewritten on the way in
//!
//! Run with: `cargo run --example rails_like_policy`

use sanitize_policy::{
    AlignToStyle, CallbackPoint, CssSanitizer, FieldSanitizer, Policy, Protocol, RenameElement,
    Sanitizer, Tainted,
};

struct Article {
    title: Option<String>,
    body: Option<String>,
}

fn build_policy() -> Policy {
    let css = CssSanitizer::new()
        .allow_properties(["text-align", "background-color"])
        .allow_keywords(["left", "center", "right", "justify", "rgb"]);

    Policy::builder()
        .elements([
            "a", "b", "blockquote", "br", "div", "img", "em", "i", "li", "ol", "p", "span",
            "strong", "u", "ul",
        ])
        .attributes("all", ["style"])
        .attributes("a", ["href"])
        .attributes("img", ["src"])
        .add_attribute("a", "rel", "nofollow")
        .add_attribute("a", "target", "_blank")
        .protocols("a", "href", ["ftp", "http", "https", "mailto", Protocol::RELATIVE])
        .protocols("img", "src", ["http", "https"])
        .transformer(css)
        .transformer(RenameElement::new("div", "p"))
        .transformer(AlignToStyle)
        .transformer(RenameElement::new("font", "span"))
        .entity("&amp;", "&")
        .build()
        .unwrap()
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Rails-Like Policy Example ===\n");
    let policy = build_policy();
    println!("Policy: {:?}\n", policy);

    let samples = [
        ("Legacy alignment", r#"<div align="center" style="color: red">Hello</div>"#),
        ("Font tag", r#"<font color="red" face="Comic Sans">Old school</font>"#),
        ("Links", r#"<a href="/about" onclick="steal()">About</a> <a href="javascript:x">bad</a>"#),
        ("Images", r#"<img src="https://example.com/a.png"><img src="data:image/png;base64,AA==">"#),
        ("Styles", r#"<p style="background-color: rgb(10, 20, 30); position: fixed">Box</p>"#),
        ("Scripts", r#"<p>Hi<script>alert("hello & goodbye")</script></p>"#),
    ];

    for (label, input) in samples {
        println!("--- {} ---", label);
        println!("Input:  {}", input);
        match policy.clean_with_report(input) {
            Ok((html, report)) => {
                println!("Output: {}", html);
                println!("Report: {}\n", report);
            }
            Err(e) => eprintln!("Cleaning failed: {}\n", e),
        }
    }

    println!("--- Record Fields ---");
    let fields = FieldSanitizer::new()
        .field("title", |a: &Article| a.title.as_deref(), |a, v| a.title = Some(v))
        .field("body", |a: &Article| a.body.as_deref(), |a, v| a.body = Some(v))
        .on(CallbackPoint::Save);
    println!("Hook {} runs {}", fields.name(), fields.point().hook_name());

    let mut article = Article {
        title: Some("<b>Launch</b> <marquee>day</marquee>".to_string()),
        body: Some(r#"<div align="right">Signed, <font>the team</font></div>"#.to_string()),
    };
    match fields.apply(&policy, &mut article) {
        Ok(changed) => {
            println!("Rewrote {} field(s)", changed);
            println!("Title: {:?}", article.title);
            println!("Body:  {:?}", article.body);
        }
        Err(e) => eprintln!("Field cleaning failed: {}", e),
    }

    println!("\n--- Tainted Input ---");
    let tainted = Tainted::new(r#"<em>fine</em><iframe src="//evil"></iframe>"#.to_string());
    match policy.sanitize(tainted) {
        Ok(safe) => println!("Safe HTML: {}", safe),
        Err(e) => eprintln!("Sanitization failed: {}", e),
    }
}
