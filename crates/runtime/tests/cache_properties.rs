mod common;

use homesales_common::models::HomeSale;
use homesales_runtime::query::catalog::AnalysisQuery;
use homesales_runtime::query::report::result_fingerprint;
use proptest::prelude::*;

use common::Workspace;

fn home_sale() -> impl Strategy<Value = HomeSale> {
    (
        2014i32..2016,
        1u32..=12,
        1u32..=28,
        2005i32..2016,
        100i64..2000,
        2i32..6,
        1i32..5,
        800i32..4000,
        1i32..4,
        prop::sample::select(vec![0i32, 10, 20, 30, 40]),
    )
        .prop_map(
            |(year, month, day, built, price_k, bedrooms, bathrooms, sqft, floors, view)| HomeSale {
                id: String::new(),
                date: format!("{year}-{month:02}-{day:02}"),
                date_built: built,
                price: price_k * 1_000,
                bedrooms,
                bathrooms,
                sqft_living: sqft,
                sqft_lot: sqft * 2,
                floors,
                waterfront: 0,
                view,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn cached_results_equal_uncached(mut sales in prop::collection::vec(home_sale(), 1..60)) {
        for (i, sale) in sales.iter_mut().enumerate() {
            sale.id = format!("s{}", i);
        }

        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let workspace = Workspace::with_csv(&HomeSale::to_csv(&sales)).unwrap();
            let engine = workspace.loaded_engine().await.unwrap();

            let uncached: Vec<String> = {
                let mut prints = vec![];
                for query in AnalysisQuery::all() {
                    let output = engine.execute(&query.sql("home_sales")).await.unwrap();
                    prints.push(result_fingerprint(&output.batches).unwrap());
                }
                prints
            };

            engine.cache_view("home_sales").await.unwrap();
            for (query, expected) in AnalysisQuery::all().into_iter().zip(&uncached) {
                let output = engine.execute(&query.sql("home_sales")).await.unwrap();
                assert!(output.served_from_cache());
                assert_eq!(&result_fingerprint(&output.batches).unwrap(), expected);
            }
        });
    }
}
