//! The analysis queries of the home sales walkthrough.
//!
//! Every query averages `price`, rounds to cents and orders its grouping key
//! descending. Rendering takes the view name so the same query runs against
//! the CSV view, its cached copy, or the partitioned Parquet view.

use homesales_error::{ErrorCode, HomeSalesError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisQuery {
    /// Average price of four-bedroom homes per year of sale
    FourBedroomPriceByYearSold,
    /// Average price of three-bed, three-bath homes per construction year
    ThreeBedThreeBathPriceByYearBuilt,
    /// As above, limited to two floors and at least 2,000 sqft of living area
    LargeTwoStoryPriceByYearBuilt,
    /// Average price per view rating, for ratings averaging at least $350,000
    PriceByViewRating,
}

/// Minimum average price kept by [`AnalysisQuery::PriceByViewRating`].
pub const VIEW_RATING_PRICE_FLOOR: i64 = 350_000;

impl AnalysisQuery {
    pub fn all() -> [AnalysisQuery; 4] {
        [
            Self::FourBedroomPriceByYearSold,
            Self::ThreeBedThreeBathPriceByYearBuilt,
            Self::LargeTwoStoryPriceByYearBuilt,
            Self::PriceByViewRating,
        ]
    }

    /// 1-based position in the walkthrough
    pub fn number(&self) -> usize {
        match self {
            Self::FourBedroomPriceByYearSold => 1,
            Self::ThreeBedThreeBathPriceByYearBuilt => 2,
            Self::LargeTwoStoryPriceByYearBuilt => 3,
            Self::PriceByViewRating => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FourBedroomPriceByYearSold => "four-bedroom-by-year-sold",
            Self::ThreeBedThreeBathPriceByYearBuilt => "three-bed-three-bath-by-year-built",
            Self::LargeTwoStoryPriceByYearBuilt => "large-two-story-by-year-built",
            Self::PriceByViewRating => "price-by-view-rating",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::FourBedroomPriceByYearSold => {
                "Average price of a four-bedroom home sold in each year"
            }
            Self::ThreeBedThreeBathPriceByYearBuilt => {
                "Average price of a three-bedroom, three-bathroom home by year built"
            }
            Self::LargeTwoStoryPriceByYearBuilt => {
                "Average price of a 3-bed, 3-bath, two-floor home of at least 2,000 sqft by year built"
            }
            Self::PriceByViewRating => {
                "Average price per view rating, for ratings averaging $350,000 or more"
            }
        }
    }

    /// SQL for this query against `table`.
    pub fn sql(&self, table: &str) -> String {
        match self {
            Self::FourBedroomPriceByYearSold => format!(
                "SELECT CAST(date_part('year', date) AS INT) AS year_sold, \
                 ROUND(AVG(price), 2) AS avg_price \
                 FROM {table} \
                 WHERE bedrooms = 4 \
                 GROUP BY year_sold \
                 ORDER BY year_sold DESC"
            ),
            Self::ThreeBedThreeBathPriceByYearBuilt => format!(
                "SELECT date_built, ROUND(AVG(price), 2) AS avg_price \
                 FROM {table} \
                 WHERE bedrooms = 3 AND bathrooms = 3 \
                 GROUP BY date_built \
                 ORDER BY date_built DESC"
            ),
            Self::LargeTwoStoryPriceByYearBuilt => format!(
                "SELECT date_built, ROUND(AVG(price), 2) AS avg_price \
                 FROM {table} \
                 WHERE bedrooms = 3 AND bathrooms = 3 AND floors = 2 AND sqft_living >= 2000 \
                 GROUP BY date_built \
                 ORDER BY date_built DESC"
            ),
            Self::PriceByViewRating => format!(
                "SELECT \"view\", ROUND(AVG(price), 2) AS avg_price \
                 FROM {table} \
                 GROUP BY \"view\" \
                 HAVING AVG(price) >= {VIEW_RATING_PRICE_FLOOR} \
                 ORDER BY \"view\" DESC"
            ),
        }
    }
}

impl fmt::Display for AnalysisQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AnalysisQuery {
    type Err = HomeSalesError;

    /// Accepts the kebab-case name or the 1-based number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|q| q.name() == wanted || q.number().to_string() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::all().iter().map(|q| q.name()).collect();
                HomeSalesError::new(ErrorCode::UnknownQuery, format!("Unknown query '{}'", s))
                    .with_hint(format!("Use 1-4 or one of: {}", names.join(", ")))
            })
    }
}
