// Endpoint mapper
//
// Pure mapping from (logical endpoint, identifiers, authorization) to a
// concrete `ApiRequest`. Nothing here performs I/O. Per-site endpoints
// take the site ID as a constructor argument, so they cannot be built
// before the site list has been consulted.

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::auth::ApiScheme;
use crate::error::Error;
use crate::transport::ApiRequest;

const PRIVATE_BASE: &str = "https://portal.redbacktech.com/api/v2/";
const PUBLIC_BASE: &str = "https://api.redbacktech.com/Api/v2/";

/// Base URLs for both API surfaces. Each must end in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrls {
    /// Portal API used by the private scheme.
    pub private_base: Url,
    /// Data API used by the public scheme.
    pub public_base: Url,
    /// Where `Auth/token` lives for the public scheme.
    pub auth_base: Url,
}

impl Default for ApiUrls {
    fn default() -> Self {
        Self {
            private_base: Url::parse(PRIVATE_BASE).expect("static URL"),
            public_base: Url::parse(PUBLIC_BASE).expect("static URL"),
            auth_base: Url::parse(PUBLIC_BASE).expect("static URL"),
        }
    }
}

impl ApiUrls {
    /// Point every surface at one root (mock servers, proxies).
    pub fn from_root(root: &str) -> Result<Self, Error> {
        let root = normalize_base(root)?;
        Ok(Self {
            private_base: root.clone(),
            public_base: root.clone(),
            auth_base: root,
        })
    }

    /// Override the portal base used by the private scheme.
    pub fn with_private_base(mut self, raw: &str) -> Result<Self, Error> {
        self.private_base = normalize_base(raw)?;
        Ok(self)
    }

    /// Override the public data base; `Auth/token` moves with it.
    pub fn with_public_base(mut self, raw: &str) -> Result<Self, Error> {
        let base = normalize_base(raw)?;
        self.auth_base = base.clone();
        self.public_base = base;
        Ok(self)
    }
}

/// Parse a base URL, guaranteeing a trailing slash so `join` appends.
pub fn normalize_base(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Every logical endpoint either scheme uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `GET {private}/inverterinfo?SerialNumber={serial}`
    InverterInfo { serial: &'a str },
    /// `GET {private}/BannerInfo?SerialNumber={serial}`
    BannerInfo { serial: &'a str },
    /// `GET {private}/energyflowd2/{serial}`
    EnergyFlow { serial: &'a str },
    /// `POST {auth}/Auth/token`
    Token,
    /// `GET {public}/EnergyData/With/Nodes` -- needs no site ID.
    SiteList,
    /// `GET {public}/EnergyData/{site_id}/Static`
    SiteStatic { site_id: &'a str },
    /// `GET {public}/EnergyData/{site_id}/Dynamic?metadata=true`
    SiteDynamic { site_id: &'a str },
}

/// How a request proves who it is.
#[derive(Debug, Clone, Copy)]
pub enum Authorization<'a> {
    /// Raw `Cookie` header value (private scheme).
    Cookie(&'a SecretString),
    /// Full `Authorization` header value, `"{type} {token}"` (public scheme).
    Bearer(&'a SecretString),
    /// Token endpoint: credentials travel in the form body.
    ClientCredentials {
        client_id: &'a str,
        client_secret: &'a SecretString,
    },
}

impl Endpoint<'_> {
    pub fn scheme(&self) -> ApiScheme {
        match self {
            Self::InverterInfo { .. } | Self::BannerInfo { .. } | Self::EnergyFlow { .. } => {
                ApiScheme::Private
            }
            Self::Token | Self::SiteList | Self::SiteStatic { .. } | Self::SiteDynamic { .. } => {
                ApiScheme::Public
            }
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Token => Method::POST,
            _ => Method::GET,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InverterInfo { .. } => "inverterinfo",
            Self::BannerInfo { .. } => "BannerInfo",
            Self::EnergyFlow { .. } => "energyflowd2",
            Self::Token => "token",
            Self::SiteList => "sites",
            Self::SiteStatic { .. } => "static",
            Self::SiteDynamic { .. } => "dynamic",
        }
    }

    /// Resolve the full URL for this endpoint.
    pub fn url(&self, urls: &ApiUrls) -> Result<Url, Error> {
        match *self {
            Self::InverterInfo { serial } => {
                let mut url = urls.private_base.join("inverterinfo")?;
                url.query_pairs_mut().append_pair("SerialNumber", serial);
                Ok(url)
            }
            Self::BannerInfo { serial } => {
                let mut url = urls.private_base.join("BannerInfo")?;
                url.query_pairs_mut().append_pair("SerialNumber", serial);
                Ok(url)
            }
            Self::EnergyFlow { serial } => push_segments(&urls.private_base, &["energyflowd2", serial]),
            Self::Token => Ok(urls.auth_base.join("Auth/token")?),
            Self::SiteList => Ok(urls.public_base.join("EnergyData/With/Nodes")?),
            Self::SiteStatic { site_id } => {
                push_segments(&urls.public_base, &["EnergyData", site_id, "Static"])
            }
            Self::SiteDynamic { site_id } => {
                let mut url = push_segments(&urls.public_base, &["EnergyData", site_id, "Dynamic"])?;
                url.query_pairs_mut().append_pair("metadata", "true");
                Ok(url)
            }
        }
    }

    /// Build the complete request: URL, method, headers, and form body.
    pub fn request(&self, urls: &ApiUrls, auth: Authorization<'_>) -> Result<ApiRequest, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut form = None;
        match auth {
            Authorization::Cookie(cookie) => {
                headers.insert(COOKIE, sensitive(cookie, "Cookie")?);
            }
            Authorization::Bearer(value) => {
                headers.insert(AUTHORIZATION, sensitive(value, "Authorization")?);
            }
            Authorization::ClientCredentials {
                client_id,
                client_secret,
            } => {
                form = Some(vec![
                    ("client_id", client_id.to_owned()),
                    ("client_secret", client_secret.expose_secret().to_owned()),
                ]);
            }
        }

        Ok(ApiRequest {
            method: self.method(),
            url: self.url(urls)?,
            headers,
            form,
        })
    }
}

fn push_segments(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn sensitive(secret: &SecretString, name: &'static str) -> Result<HeaderValue, Error> {
    let mut value =
        HeaderValue::from_str(secret.expose_secret()).map_err(|_| Error::InvalidHeader(name))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn urls() -> ApiUrls {
        ApiUrls::from_root("https://example.test/api/v2").unwrap()
    }

    #[test]
    fn private_paths() {
        let urls = urls();
        assert_eq!(
            Endpoint::InverterInfo { serial: "RB123" }.url(&urls).unwrap().as_str(),
            "https://example.test/api/v2/inverterinfo?SerialNumber=RB123"
        );
        assert_eq!(
            Endpoint::BannerInfo { serial: "RB123" }.url(&urls).unwrap().as_str(),
            "https://example.test/api/v2/BannerInfo?SerialNumber=RB123"
        );
        assert_eq!(
            Endpoint::EnergyFlow { serial: "RB123" }.url(&urls).unwrap().as_str(),
            "https://example.test/api/v2/energyflowd2/RB123"
        );
    }

    #[test]
    fn public_paths() {
        let urls = urls();
        assert_eq!(
            Endpoint::SiteList.url(&urls).unwrap().as_str(),
            "https://example.test/api/v2/EnergyData/With/Nodes"
        );
        assert_eq!(
            Endpoint::SiteStatic { site_id: "S42" }.url(&urls).unwrap().as_str(),
            "https://example.test/api/v2/EnergyData/S42/Static"
        );
        assert_eq!(
            Endpoint::SiteDynamic { site_id: "S42" }.url(&urls).unwrap().as_str(),
            "https://example.test/api/v2/EnergyData/S42/Dynamic?metadata=true"
        );
        assert_eq!(
            Endpoint::Token.url(&urls).unwrap().as_str(),
            "https://example.test/api/v2/Auth/token"
        );
    }

    #[test]
    fn base_overrides_keep_auth_with_public() {
        let urls = ApiUrls::default()
            .with_public_base("http://localhost:8080/Api/v2")
            .unwrap();
        assert_eq!(urls.auth_base.as_str(), "http://localhost:8080/Api/v2/");
        assert_eq!(
            urls.private_base.as_str(),
            "https://portal.redbacktech.com/api/v2/"
        );
        assert!(ApiUrls::default().with_private_base("not a url").is_err());
    }

    #[test]
    fn site_id_is_escaped_as_one_segment() {
        let url = Endpoint::SiteStatic { site_id: "a/b" }.url(&urls()).unwrap();
        assert_eq!(url.path(), "/api/v2/EnergyData/a%2Fb/Static");
    }

    #[test]
    fn cookie_header_is_sensitive() {
        let cookie = SecretString::from(".AspNet.ApplicationCookie=abc".to_owned());
        let req = Endpoint::EnergyFlow { serial: "RB1" }
            .request(&urls(), Authorization::Cookie(&cookie))
            .unwrap();
        let value = req.headers.get(COOKIE).unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), ".AspNet.ApplicationCookie=abc");
        assert_eq!(req.method, Method::GET);
        assert!(req.form.is_none());
    }

    #[test]
    fn token_request_carries_form() {
        let secret = SecretString::from("s3cret".to_owned());
        let req = Endpoint::Token
            .request(
                &urls(),
                Authorization::ClientCredentials {
                    client_id: "cid",
                    client_secret: &secret,
                },
            )
            .unwrap();
        assert_eq!(req.method, Method::POST);
        let form = req.form.unwrap();
        assert_eq!(form[0], ("client_id", "cid".to_owned()));
        assert_eq!(form[1], ("client_secret", "s3cret".to_owned()));
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_header() {
        let bearer = SecretString::from("Bearer xyz".to_owned());
        let req = Endpoint::SiteList
            .request(&urls(), Authorization::Bearer(&bearer))
            .unwrap();
        assert_eq!(req.headers.get(AUTHORIZATION).unwrap(), "Bearer xyz");
    }

    #[test]
    fn scheme_of_endpoints() {
        assert_eq!(Endpoint::Token.scheme(), ApiScheme::Public);
        assert_eq!(Endpoint::BannerInfo { serial: "x" }.scheme(), ApiScheme::Private);
    }

    #[test]
    fn newline_in_cookie_is_rejected() {
        let cookie = SecretString::from("bad\nvalue".to_owned());
        let err = Endpoint::EnergyFlow { serial: "RB1" }
            .request(&urls(), Authorization::Cookie(&cookie))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader("Cookie")));
    }
}
