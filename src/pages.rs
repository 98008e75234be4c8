//! HTML rendering for the home page and directory listings.

use htmlescape::encode_minimal;

use crate::listing::Listing;
use crate::root::ServerRoot;

/// `/browse/` link for a root-relative path, each segment percent-encoded.
pub fn browse_href(relative: &str) -> String {
    let encoded: Vec<String> = relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("/browse/{}", encoded.join("/"))
}

pub fn home_page(root: &ServerRoot) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>dirshare</title></head><body>
<h1>File Server (Serving: {root})</h1>
<form method="post" action="/upload" enctype="multipart/form-data">
    <input type="file" name="file">
    <input type="submit" value="Upload to Current Dir">
</form>
<p><a href="/browse">Browse Current Directory</a></p>
<hr>
<h2>Change Server Directory</h2>
<form method="get" action="/change_dir">
    <input type="text" name="new_dir" placeholder="Enter absolute path">
    <input type="submit" value="Change Directory">
</form>
</body></html>
"#,
        root = encode_minimal(&root.to_string()),
    )
}

pub fn listing_page(listing: &Listing) -> String {
    let title = encode_minimal(&format!("/{}", listing.path));
    let mut html = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head><body>\n\
         <h1>Directory listing for {title}</h1>\n<ul>\n"
    );

    if let Some(parent) = &listing.parent {
        html.push_str(&format!(
            "<li><a href=\"{}\">[Parent Directory]</a></li>\n",
            browse_href(parent)
        ));
    }

    for entry in &listing.entries {
        let suffix = if entry.is_dir() { "/" } else { "" };
        html.push_str(&format!(
            "<li><a href=\"{}\">{}{}</a></li>\n",
            browse_href(&entry.path),
            encode_minimal(&entry.name),
            suffix
        ));
    }

    html.push_str("</ul>\n<hr><a href=\"/\">Go Home</a></body></html>\n");
    html
}

pub fn upload_page(name: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><body><p>File \"{}\" uploaded successfully! \
         Browse files <a href=\"/browse\">here</a>.</p></body></html>\n",
        encode_minimal(name)
    )
}
