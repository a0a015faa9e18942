//! Per-site harvesting profiles
//!
//! Everything that differs between the two library sites lives here: where the
//! sitemaps are, how category listings paginate, what a detail URL looks like,
//! and which static tags and defaults a record receives.

use crate::record::Source;
use crate::{UrlError, UrlResult};
use std::collections::BTreeSet;
use url::Url;

const BIBLIOMETRO_SITEMAPS: &[&str] = &[
    "/sitemap_index.xml",
    "/wp-sitemap.xml",
    "/post-sitemap.xml",
    "/page-sitemap.xml",
];

const BIBLIOMETRO_CATEGORIES: &[&str] = &[
    "Literatura",
    "Arte",
    "Autoayuda",
    "Biografías",
    "Ciencias sociales",
    "Cocina",
    "Cómics",
    "Ecología",
    "Esoterismo",
    "Filosofía",
    "Género",
    "Historia",
    "Literatura infantil",
    "Literatura juvenil",
    "Manualidades",
    "Periodismo",
    "Poesía",
    "Pueblos Originarios",
    "Sagas",
    "Salud física y mental",
];

/// How a site's listing pages are addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScheme {
    /// `<path>?categoria=<name>` for page 1, `<path>page/<n>/?categoria=<name>` after
    CatalogQuery { path: &'static str },

    /// A single unpaginated landing page (the site root)
    Homepage,
}

/// Static description of one harvestable site
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub source: Source,
    pub base_url: Url,

    /// Path fragments identifying detail pages
    pub detail_markers: &'static [&'static str],

    /// Candidate sitemap paths, tried in order
    pub sitemap_paths: &'static [&'static str],

    /// Category names walked by the category crawl
    pub categories: &'static [&'static str],

    pub listing: ListingScheme,

    /// Suffix appended to `<title>` by the site (stripped when used as a title)
    pub title_suffix: &'static str,

    /// Author recorded when no extractor succeeds
    pub default_author: &'static str,

    /// Tags every record from this site carries
    pub base_tags: &'static [&'static str],
}

impl SiteProfile {
    /// Builds the profile for a source, optionally overriding its base URL
    ///
    /// # Arguments
    ///
    /// * `source` - The site to harvest
    /// * `base_url` - Replacement for the built-in site root (mirrors, mock servers)
    ///
    /// # Returns
    ///
    /// * `Ok(SiteProfile)` - Profile ready for discovery and extraction
    /// * `Err(UrlError)` - The override is not an absolute http(s) URL
    pub fn for_source(source: Source, base_url: Option<&str>) -> UrlResult<Self> {
        let raw_base = base_url.unwrap_or(match source {
            Source::Bibliometro => "https://bibliometro.cl",
            Source::BibliotecaNacional => "https://www.bibliotecanacional.gob.cl",
        });

        let base_url = Url::parse(raw_base).map_err(|e| UrlError::Parse(e.to_string()))?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(base_url.scheme().to_string()));
        }
        if base_url.host_str().is_none() {
            return Err(UrlError::MissingHost(raw_base.to_string()));
        }

        let profile = match source {
            Source::Bibliometro => Self {
                source,
                base_url,
                detail_markers: &["/libros/"],
                sitemap_paths: BIBLIOMETRO_SITEMAPS,
                categories: BIBLIOMETRO_CATEGORIES,
                listing: ListingScheme::CatalogQuery { path: "/catalogo/" },
                title_suffix: " - Bibliometro",
                default_author: "Desconocido",
                base_tags: &["bibliometro"],
            },
            Source::BibliotecaNacional => Self {
                source,
                base_url,
                detail_markers: &["/noticias/", "/cartelera/", "/colecciones-digitales/"],
                sitemap_paths: &[],
                categories: &["portada"],
                listing: ListingScheme::Homepage,
                title_suffix: " - Biblioteca Nacional",
                default_author: "Biblioteca Nacional",
                base_tags: &["bnc", "chile"],
            },
        };

        Ok(profile)
    }

    /// Returns true if the URL points at a detail page of this site
    pub fn is_detail_url(&self, url: &Url) -> bool {
        let path = url.path();
        self.detail_markers.iter().any(|marker| path.contains(marker))
    }

    /// Absolute URLs of the candidate sitemaps
    pub fn sitemap_urls(&self) -> Vec<Url> {
        self.sitemap_paths
            .iter()
            .filter_map(|path| self.base_url.join(path).ok())
            .collect()
    }

    /// URL of one listing page for a category
    ///
    /// Returns `None` when the site has no such page (page > 1 on an
    /// unpaginated listing), which ends pagination for that category.
    pub fn category_page_url(&self, category: &str, page: u32) -> Option<Url> {
        match self.listing {
            ListingScheme::CatalogQuery { path } => {
                let page_path = if page <= 1 {
                    path.to_string()
                } else {
                    format!("{}page/{}/", path, page)
                };
                let mut url = self.base_url.join(&page_path).ok()?;
                url.query_pairs_mut().append_pair("categoria", category);
                Some(url)
            }
            ListingScheme::Homepage => (page <= 1).then(|| self.base_url.clone()),
        }
    }

    /// Static classification tags for a record found at `url`
    pub fn tags_for(&self, url: &Url) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = self.base_tags.iter().map(|t| t.to_string()).collect();

        if self.source == Source::BibliotecaNacional {
            let section = if url.path().contains("/cartelera/") {
                "cultura"
            } else {
                "noticia"
            };
            tags.insert(section.to_string());
        }

        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bibliometro() -> SiteProfile {
        SiteProfile::for_source(Source::Bibliometro, None).unwrap()
    }

    #[test]
    fn test_default_base_urls() {
        assert_eq!(bibliometro().base_url.as_str(), "https://bibliometro.cl/");
        let bnc = SiteProfile::for_source(Source::BibliotecaNacional, None).unwrap();
        assert_eq!(
            bnc.base_url.as_str(),
            "https://www.bibliotecanacional.gob.cl/"
        );
    }

    #[test]
    fn test_base_url_override() {
        let profile =
            SiteProfile::for_source(Source::Bibliometro, Some("http://127.0.0.1:8080")).unwrap();
        assert_eq!(
            profile.sitemap_urls()[0].as_str(),
            "http://127.0.0.1:8080/sitemap_index.xml"
        );
    }

    #[test]
    fn test_invalid_override_rejected() {
        assert!(SiteProfile::for_source(Source::Bibliometro, Some("not a url")).is_err());
        assert!(matches!(
            SiteProfile::for_source(Source::Bibliometro, Some("ftp://bibliometro.cl")),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_detail_url_matching() {
        let profile = bibliometro();
        let detail = Url::parse("https://bibliometro.cl/libros/el-tunel/").unwrap();
        let listing = Url::parse("https://bibliometro.cl/catalogo/?categoria=Arte").unwrap();
        assert!(profile.is_detail_url(&detail));
        assert!(!profile.is_detail_url(&listing));
    }

    #[test]
    fn test_catalog_pagination_urls() {
        let profile = bibliometro();

        let first = profile.category_page_url("Arte", 1).unwrap();
        assert_eq!(first.path(), "/catalogo/");
        assert_eq!(first.query(), Some("categoria=Arte"));

        let third = profile.category_page_url("Ciencias sociales", 3).unwrap();
        assert_eq!(third.path(), "/catalogo/page/3/");
        let pairs: Vec<_> = third.query_pairs().collect();
        assert_eq!(pairs[0].1, "Ciencias sociales");
    }

    #[test]
    fn test_homepage_listing_has_single_page() {
        let bnc = SiteProfile::for_source(Source::BibliotecaNacional, None).unwrap();
        assert_eq!(bnc.category_page_url("portada", 1), Some(bnc.base_url.clone()));
        assert_eq!(bnc.category_page_url("portada", 2), None);
    }

    #[test]
    fn test_section_tags() {
        let bnc = SiteProfile::for_source(Source::BibliotecaNacional, None).unwrap();

        let news = Url::parse("https://www.bibliotecanacional.gob.cl/noticias/x").unwrap();
        let tags = bnc.tags_for(&news);
        assert!(tags.contains("bnc") && tags.contains("chile") && tags.contains("noticia"));

        let agenda = Url::parse("https://www.bibliotecanacional.gob.cl/cartelera/y").unwrap();
        assert!(bnc.tags_for(&agenda).contains("cultura"));

        let detail = Url::parse("https://bibliometro.cl/libros/z/").unwrap();
        let tags = bibliometro().tags_for(&detail);
        assert_eq!(tags.len(), 1);
        assert!(tags.contains("bibliometro"));
    }
}
