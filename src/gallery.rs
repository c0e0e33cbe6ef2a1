//! The gallery page: a single static `index.html` per album.
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating, so
//! the album name and file names are HTML-escaped. The download URL reaches
//! the script through a `data-` attribute rather than being spliced into
//! JavaScript source.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::album::{image_path, thumbnail_path};

const CSS: &str = "\
body{background-color:#000;color:#ddd;font-family:sans-serif;margin:0}\
h1{font-weight:normal;font-size:1.2em;margin:12px 5%}\
#download_link{position:absolute;top:8px;right:8px;z-index:1}\
#download_link a{color:#ddd}\
#gallery{padding:0 5%;width:90%}\
.thumbs{list-style:none;margin:0;padding:0;display:flex;flex-wrap:wrap;gap:6px}\
.thumbs img{display:block;border:0}";

/// Shows the download link only if the archive actually answers a HEAD request
const DOWNLOAD_PROBE_JS: &str = r#"
(function () {
  var url = document.body.getAttribute('data-download-url');
  if (!url) { return; }
  fetch(url, { method: 'HEAD' }).then(function (response) {
    if (!response.ok) { return; }
    var link = document.createElement('a');
    link.href = url;
    link.textContent = 'Download images';
    var wrapper = document.createElement('div');
    wrapper.id = 'download_link';
    wrapper.appendChild(link);
    document.body.insertBefore(wrapper, document.body.firstChild);
  }).catch(function () {});
})();
"#;

/// Render the page for `album`
///
/// Thumbnails appear in `file_names` order, each linking to its display image.
pub fn render_gallery(album: &str, zip_url: &str, file_names: &[String]) -> String {
    let page: Markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (album) }
                style { (PreEscaped(CSS)) }
            }
            body data-download-url=(zip_url) {
                h1 { (album) }
                div id="gallery" {
                    ul.thumbs {
                        @for name in file_names {
                            li {
                                a href=(image_path(name)) {
                                    img src=(thumbnail_path(name)) alt=(name);
                                }
                            }
                        }
                    }
                }
                script { (PreEscaped(DOWNLOAD_PROBE_JS)) }
            }
        }
    };
    page.into_string()
}
