use std::borrow::Cow;

/// Watchlist tab filter, carried as `?media=` on the index page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFilter {
    #[default]
    All,
    Movie,
    Tv,
}

impl MediaFilter {
    /// Anything other than `movie` or `tv` means all
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("movie") => MediaFilter::Movie,
            Some("tv") => MediaFilter::Tv,
            _ => MediaFilter::All,
        }
    }

    /// Filter selected by a URL or a bare query string
    pub fn from_url(url: &str) -> Self {
        Self::from_param(query_param(url, "media").as_deref())
    }

    pub fn param(self) -> Option<&'static str> {
        match self {
            MediaFilter::All => None,
            MediaFilter::Movie => Some("movie"),
            MediaFilter::Tv => Some("tv"),
        }
    }
}

/// First value of `name` in the query part of `url`, percent-decoded
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let query = match url.split_once('?') {
        Some((_, q)) => q,
        None if url.contains('=') => url,
        None => return None,
    };
    let query = query.split('#').next().unwrap_or_default();

    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode(key) == name {
            Some(decode(value).into_owned())
        } else {
            None
        }
    })
}

fn decode(s: &str) -> Cow<'_, str> {
    let spaced = s.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Borrowed(s),
    }
}

/// Link for a tab, keeping the streaming-provider filter if one is set
pub fn tab_href(filter: MediaFilter, provider: Option<&str>) -> String {
    let mut params = Vec::new();
    if let Some(media) = filter.param() {
        params.push(format!("media={}", media));
    }
    if let Some(provider) = provider.filter(|p| !p.is_empty()) {
        params.push(format!("provider={}", urlencoding::encode(provider)));
    }

    if params.is_empty() {
        "/".to_string()
    } else {
        format!("/?{}", params.join("&"))
    }
}

/// Rewrite tab links for `location`, carrying its provider filter over to
/// every tab
pub fn tab_links<S: AsRef<str>>(tab_hrefs: &[S], location: &str) -> Vec<String> {
    let provider = query_param(location, "provider");
    tab_hrefs
        .iter()
        .map(|href| tab_href(MediaFilter::from_url(href.as_ref()), provider.as_deref()))
        .collect()
}

/// Index of the tab to highlight for the current location
pub fn active_tab<S: AsRef<str>>(tab_hrefs: &[S], location: &str) -> Option<usize> {
    let current = MediaFilter::from_url(location);
    tab_hrefs
        .iter()
        .position(|href| MediaFilter::from_url(href.as_ref()) == current)
}
