//! Route table
//!
//! Every inbound route maps to a [`RouteSpec`]: its family, the upstream path
//! template and a pure parameter policy. Policies depend only on the inbound
//! parameters, which keeps cache fingerprints deterministic.

use std::fmt::Display;

use crate::{
    error::{AppError, AppResult},
    models::{InboundParams, UpstreamRequest},
};

/// Sub-resources fetched together with a movie or TV show
pub const TITLE_APPENDS: &str = "videos,credits,similar,recommendations";
/// Sub-resources fetched together with a person
pub const PERSON_APPENDS: &str = "movie_credits,tv_credits";
/// Default ordering for list and discover endpoints
pub const DEFAULT_SORT: &str = "popularity.desc";

/// Logical group of endpoints sharing a parameter policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteFamily {
    MoviesList,
    MovieById,
    MovieSubresource,
    Tv,
    Person,
    Genres,
    Discover,
    Search,
}

impl Display for RouteFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RouteFamily::MoviesList => "movies-list",
            RouteFamily::MovieById => "movie-by-id",
            RouteFamily::MovieSubresource => "movie-subresource",
            RouteFamily::Tv => "tv",
            RouteFamily::Person => "person",
            RouteFamily::Genres => "genres",
            RouteFamily::Discover => "discover",
            RouteFamily::Search => "search",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieList {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieSubresource {
    Credits,
    Videos,
    Similar,
    Recommendations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Tv,
}

/// An inbound proxy route, with any path parameters it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/movies`: search when a query is given, popular otherwise
    Movies,
    MovieList(MovieList),
    Movie { id: String },
    MovieSub { id: String, sub: MovieSubresource },
    TvPopular,
    Tv { id: String },
    Person { id: String },
    Genres(MediaKind),
    Discover(MediaKind),
    SearchMulti,
    SearchMovie,
}

/// Maps inbound parameters to an upstream request
///
/// Receives the upstream path with `{id}` already substituted.
pub type ParamPolicy = fn(String, &InboundParams) -> AppResult<UpstreamRequest>;

/// Static description of how a route reaches upstream
#[derive(Clone, Copy)]
pub struct RouteSpec {
    pub family: RouteFamily,
    pub path_template: &'static str,
    pub param_policy: ParamPolicy,
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("family", &self.family)
            .field("path_template", &self.path_template)
            .finish()
    }
}

impl Route {
    pub fn spec(&self) -> RouteSpec {
        use RouteFamily as F;

        let (family, path_template, param_policy): (RouteFamily, &'static str, ParamPolicy) =
            match self {
                Route::Movies => (F::MoviesList, "/movie/popular", movies_list),
                Route::MovieList(list) => {
                    let path = match list {
                        MovieList::Popular => "/movie/popular",
                        MovieList::TopRated => "/movie/top_rated",
                        MovieList::Upcoming => "/movie/upcoming",
                        MovieList::NowPlaying => "/movie/now_playing",
                    };
                    (F::MoviesList, path, page_only)
                }
                Route::Movie { .. } => (F::MovieById, "/movie/{id}", with_title_appends),
                Route::MovieSub { sub, .. } => match sub {
                    MovieSubresource::Credits => (F::MovieSubresource, "/movie/{id}/credits", no_params),
                    MovieSubresource::Videos => (F::MovieSubresource, "/movie/{id}/videos", no_params),
                    MovieSubresource::Similar => (F::MovieSubresource, "/movie/{id}/similar", page_only),
                    MovieSubresource::Recommendations => {
                        (F::MovieSubresource, "/movie/{id}/recommendations", page_only)
                    }
                },
                Route::TvPopular => (F::Tv, "/tv/popular", page_only),
                Route::Tv { .. } => (F::Tv, "/tv/{id}", with_title_appends),
                Route::Person { .. } => (F::Person, "/person/{id}", with_person_appends),
                Route::Genres(MediaKind::Movie) => (F::Genres, "/genre/movie/list", no_params),
                Route::Genres(MediaKind::Tv) => (F::Genres, "/genre/tv/list", no_params),
                Route::Discover(MediaKind::Movie) => (F::Discover, "/discover/movie", discover_movie),
                Route::Discover(MediaKind::Tv) => (F::Discover, "/discover/tv", discover_tv),
                Route::SearchMulti => (F::Search, "/search/multi", search_multi),
                Route::SearchMovie => (F::Search, "/search/movie", search_movie),
            };

        RouteSpec {
            family,
            path_template,
            param_policy,
        }
    }

    pub fn family(&self) -> RouteFamily {
        self.spec().family
    }

    fn id(&self) -> Option<&str> {
        match self {
            Route::Movie { id }
            | Route::MovieSub { id, .. }
            | Route::Tv { id }
            | Route::Person { id } => Some(id),
            _ => None,
        }
    }

    /// Resolves the upstream path and parameters for this route
    pub fn resolve(&self, params: &InboundParams) -> AppResult<UpstreamRequest> {
        let spec = self.spec();
        let path = match self.id() {
            Some(id) => {
                validate_id(id)?;
                spec.path_template.replace("{id}", id)
            }
            None => spec.path_template.to_string(),
        };
        (spec.param_policy)(path, params)
    }
}

/// TMDB ids are numeric; anything else never reaches upstream
fn validate_id(id: &str) -> AppResult<()> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!("id must be numeric, got '{}'", id)))
    }
}

fn required_query(params: &InboundParams) -> AppResult<&str> {
    params
        .non_empty("query")
        .ok_or(AppError::MissingParameter("query"))
}

fn no_params(path: String, _params: &InboundParams) -> AppResult<UpstreamRequest> {
    Ok(UpstreamRequest::new(path))
}

fn page_only(path: String, params: &InboundParams) -> AppResult<UpstreamRequest> {
    Ok(UpstreamRequest::new(path).param("page", params.page()))
}

fn with_title_appends(path: String, _params: &InboundParams) -> AppResult<UpstreamRequest> {
    Ok(UpstreamRequest::new(path).param("append_to_response", TITLE_APPENDS))
}

fn with_person_appends(path: String, _params: &InboundParams) -> AppResult<UpstreamRequest> {
    Ok(UpstreamRequest::new(path).param("append_to_response", PERSON_APPENDS))
}

fn movies_list(_path: String, params: &InboundParams) -> AppResult<UpstreamRequest> {
    let page = params.page();
    match params.non_empty("query") {
        Some(query) => Ok(UpstreamRequest::new("/search/movie")
            .param("query", query)
            .param("page", page)),
        None => Ok(UpstreamRequest::new("/movie/popular")
            .param("page", page)
            .param("sort_by", DEFAULT_SORT)),
    }
}

fn sort_by(params: &InboundParams) -> &str {
    params.non_empty("sort_by").unwrap_or(DEFAULT_SORT)
}

fn discover_movie(path: String, params: &InboundParams) -> AppResult<UpstreamRequest> {
    Ok(UpstreamRequest::new(path)
        .param("page", params.page())
        .param("sort_by", sort_by(params))
        .param_opt("with_genres", params.non_empty("with_genres"))
        .param_opt("year", params.non_empty("year"))
        .param_opt("vote_average.gte", params.non_empty("vote_average_gte"))
        .param_opt("with_watch_providers", params.non_empty("with_watch_providers")))
}

fn discover_tv(path: String, params: &InboundParams) -> AppResult<UpstreamRequest> {
    Ok(UpstreamRequest::new(path)
        .param("page", params.page())
        .param("sort_by", sort_by(params))
        .param_opt("with_genres", params.non_empty("with_genres"))
        .param_opt("first_air_date_year", params.non_empty("first_air_date_year"))
        .param_opt("vote_average.gte", params.non_empty("vote_average_gte")))
}

fn search_multi(path: String, params: &InboundParams) -> AppResult<UpstreamRequest> {
    let query = required_query(params)?;
    Ok(UpstreamRequest::new(path)
        .param("query", query)
        .param("page", params.page()))
}

fn search_movie(path: String, params: &InboundParams) -> AppResult<UpstreamRequest> {
    let query = required_query(params)?;
    let include_adult = params.get("include_adult") == Some("true");

    let request = UpstreamRequest::new(path)
        .param("query", query)
        .param("page", params.page())
        .param("include_adult", include_adult);

    // primary_release_year wins over year when both are given
    Ok(match params.non_empty("primary_release_year") {
        Some(year) => request.param("primary_release_year", year),
        None => request.param_opt("year", params.non_empty("year")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParamValue;

    fn inbound(pairs: &[(&str, &str)]) -> InboundParams {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn text(v: &str) -> ParamValue {
        ParamValue::Text(v.to_string())
    }

    #[test]
    fn test_movies_without_query_is_popular() {
        let request = Route::Movies.resolve(&InboundParams::new()).unwrap();

        assert_eq!(request.path, "/movie/popular");
        assert_eq!(request.params.get("page"), Some(&ParamValue::Int(1)));
        assert_eq!(request.params.get("sort_by"), Some(&text("popularity.desc")));
        assert!(!request.params.contains_key("query"));
    }

    #[test]
    fn test_movies_with_query_is_search() {
        let request = Route::Movies
            .resolve(&inbound(&[("query", " matrix "), ("page", "2")]))
            .unwrap();

        assert_eq!(request.path, "/search/movie");
        assert_eq!(request.params.get("query"), Some(&text("matrix")));
        assert_eq!(request.params.get("page"), Some(&ParamValue::Int(2)));
        assert!(!request.params.contains_key("sort_by"));
    }

    #[test]
    fn test_movies_with_blank_query_is_popular() {
        let request = Route::Movies.resolve(&inbound(&[("query", "   ")])).unwrap();
        assert_eq!(request.path, "/movie/popular");
    }

    #[test]
    fn test_movie_by_id_appends_subresources() {
        let request = Route::Movie { id: "550".into() }
            .resolve(&inbound(&[("page", "9")]))
            .unwrap();

        assert_eq!(request.path, "/movie/550");
        assert_eq!(request.params.len(), 1);
        assert_eq!(
            request.params.get("append_to_response"),
            Some(&text("videos,credits,similar,recommendations"))
        );
    }

    #[test]
    fn test_person_appends_credits() {
        let request = Route::Person { id: "287".into() }
            .resolve(&InboundParams::new())
            .unwrap();

        assert_eq!(request.path, "/person/287");
        assert_eq!(
            request.params.get("append_to_response"),
            Some(&text("movie_credits,tv_credits"))
        );
    }

    #[test]
    fn test_non_numeric_id_rejected() {
        let err = Route::Movie { id: "../configuration".into() }
            .resolve(&InboundParams::new())
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_subresources() {
        let credits = Route::MovieSub { id: "1".into(), sub: MovieSubresource::Credits }
            .resolve(&inbound(&[("page", "3")]))
            .unwrap();
        assert_eq!(credits.path, "/movie/1/credits");
        assert!(credits.params.is_empty());

        let similar = Route::MovieSub { id: "1".into(), sub: MovieSubresource::Similar }
            .resolve(&InboundParams::new())
            .unwrap();
        assert_eq!(similar.path, "/movie/1/similar");
        assert_eq!(similar.params.get("page"), Some(&ParamValue::Int(1)));
        assert_eq!(similar.params.len(), 1);
    }

    #[test]
    fn test_movie_lists_and_genres() {
        let top = Route::MovieList(MovieList::TopRated)
            .resolve(&InboundParams::new())
            .unwrap();
        assert_eq!(top.path, "/movie/top_rated");

        let genres = Route::Genres(MediaKind::Tv).resolve(&InboundParams::new()).unwrap();
        assert_eq!(genres.path, "/genre/tv/list");
        assert!(genres.params.is_empty());
    }

    #[test]
    fn test_discover_movie_only_includes_supplied_filters() {
        let request = Route::Discover(MediaKind::Movie)
            .resolve(&inbound(&[("with_genres", "28"), ("vote_average_gte", "7"), ("year", "")]))
            .unwrap();

        assert_eq!(request.path, "/discover/movie");
        assert_eq!(request.params.get("sort_by"), Some(&text("popularity.desc")));
        assert_eq!(request.params.get("with_genres"), Some(&text("28")));
        assert_eq!(request.params.get("vote_average.gte"), Some(&text("7")));
        assert!(!request.params.contains_key("year"));
        assert!(!request.params.contains_key("with_watch_providers"));
    }

    #[test]
    fn test_discover_tv_custom_sort() {
        let request = Route::Discover(MediaKind::Tv)
            .resolve(&inbound(&[("sort_by", "vote_average.desc"), ("first_air_date_year", "2008")]))
            .unwrap();

        assert_eq!(request.params.get("sort_by"), Some(&text("vote_average.desc")));
        assert_eq!(request.params.get("first_air_date_year"), Some(&text("2008")));
        assert_eq!(request.params.get("page"), Some(&ParamValue::Int(1)));
    }

    #[test]
    fn test_search_movie_year_precedence_and_adult_flag() {
        let request = Route::SearchMovie
            .resolve(&inbound(&[
                ("query", "alien"),
                ("year", "1986"),
                ("primary_release_year", "1979"),
                ("include_adult", "yes"),
            ]))
            .unwrap();

        assert_eq!(request.params.get("primary_release_year"), Some(&text("1979")));
        assert!(!request.params.contains_key("year"));
        assert_eq!(request.params.get("include_adult"), Some(&ParamValue::Bool(false)));

        let request = Route::SearchMovie
            .resolve(&inbound(&[("query", "alien"), ("year", "1986"), ("include_adult", "true")]))
            .unwrap();
        assert_eq!(request.params.get("year"), Some(&text("1986")));
        assert_eq!(request.params.get("include_adult"), Some(&ParamValue::Bool(true)));
    }

    #[test]
    fn test_search_requires_query() {
        for route in [Route::SearchMulti, Route::SearchMovie] {
            let err = route.resolve(&inbound(&[("page", "1")])).unwrap_err();
            assert!(matches!(err, AppError::MissingParameter("query")));

            let err = route.resolve(&inbound(&[("query", "")])).unwrap_err();
            assert!(matches!(err, AppError::MissingParameter("query")));
        }
    }

    #[test]
    fn test_families() {
        assert_eq!(Route::Movies.family(), RouteFamily::MoviesList);
        assert_eq!(Route::TvPopular.family(), RouteFamily::Tv);
        assert_eq!(Route::SearchMulti.family(), RouteFamily::Search);
        assert_eq!(RouteFamily::MovieSubresource.to_string(), "movie-subresource");
    }
}
