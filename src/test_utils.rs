//! Shared proptest strategies for unit tests.

use proptest::prelude::*;

/// Markup fragments that exercise the tricky parts of the parser and filter.
const PIECES: &[&str] = &[
    "<b>",
    "</b>",
    "<i>",
    "</i>",
    "<p>",
    "</p>",
    "<div>",
    "</div>",
    "<ul>",
    "</ul>",
    "<li>",
    "<table>",
    "<td>",
    "</table>",
    "<br>",
    "</br>",
    "<h1>",
    "<h2>",
    "<a href=\"http://example.com\">",
    "<a href='javascript:alert(1)' onclick=x()>",
    "<a href=/relative title=t>",
    "</a>",
    "<img src=x onerror=alert(1)>",
    "<script>",
    "</script>",
    "<style>",
    "</style>",
    "<textarea>",
    "<!-- note -->",
    "<!--",
    "-->",
    "<!DOCTYPE html>",
    "<?xml?>",
    "&amp;",
    "&lt;",
    "&nbsp;",
    "&#x3c;",
    "&bogus;",
    "<",
    ">",
    "\"",
    "\r\n",
];

/// Arbitrary, mostly malformed, markup.
pub(crate) fn arb_markup() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9 .,;:!?&#=/-]{0,12}").unwrap(),
        prop::sample::select(PIECES).prop_map(String::from),
    ];
    prop::collection::vec(piece, 0..24).prop_map(|pieces| pieces.concat())
}
