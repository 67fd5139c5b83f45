//! End-to-end runs of the monthly pipeline on small synthetic inputs.
//!
//! Every input is constant in space except where a test masks a pixel, so
//! the expected values follow directly from the model formulas.

use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rweq_algorithms::erosion::{PRODUCT, QMAX, S, SWEP};
use rweq_algorithms::factors::{SLRC, WF};
use rweq_algorithms::{run, RweqConfig, RweqInputs, StaticLayers};
use rweq_core::io::{export_series, read_frame, write_frame, Catalog};
use rweq_core::{Raster, RasterFrame, RasterSeries, StudyArea};

const ROWS: usize = 2;
const COLS: usize = 2;
const LAND_QA: f64 = 2048.0;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn grid(value: f64) -> Raster {
    Raster::filled(ROWS, COLS, value)
}

fn composite(t: NaiveDateTime, ndvi: Raster) -> RasterFrame {
    RasterFrame::from_band("NDVI", ndvi)
        .with_band("DetailedQA", grid(LAND_QA))
        .with_band("SummaryQA", grid(0.0))
        .with_timestamp(t)
}

fn wind_hour(t: NaiveDateTime, speed: f64) -> RasterFrame {
    RasterFrame::from_band("WIND", grid(speed)).with_timestamp(t)
}

fn land_sample(t: NaiveDateTime, evap: f64, rain: f64) -> RasterFrame {
    RasterFrame::from_band("Evap_tavg", grid(evap))
        .with_band("Rainf_tavg", grid(rain))
        .with_band("SnowDepth_inst", grid(0.0))
        .with_timestamp(t)
}

/// June and July 2018 with data, August 2018 without
fn inputs() -> RweqInputs {
    let mut ndvi = grid(2000.0);
    // negative index, screened out
    ndvi.set(1, 1, -500.0).unwrap();

    let vegetation = RasterSeries::new(vec![
        composite(at(2018, 6, 10, 0), ndvi.clone()),
        composite(at(2018, 7, 12, 0), ndvi),
    ]);

    let mut wind = Vec::new();
    for month in [6, 7] {
        for h in 0..3 {
            wind.push(wind_hour(at(2018, month, 15, h), 7.0));
        }
        wind.push(wind_hour(at(2018, month, 15, 3), 4.0));
    }

    let land_surface = RasterSeries::new(vec![
        land_sample(at(2018, 6, 1, 0), 1e-5, 1e-5),
        land_sample(at(2018, 6, 2, 0), 1e-5, 0.0),
        land_sample(at(2018, 7, 1, 0), 1e-5, 1e-5),
        land_sample(at(2018, 7, 2, 0), 1e-5, 0.0),
    ]);

    let statics = StaticLayers::new(grid(0.5), grid(0.8), grid(0.9), grid(1.2)).unwrap();

    RweqInputs {
        vegetation,
        wind: RasterSeries::new(wind),
        land_surface,
        statics,
        study_area: None,
    }
}

fn config() -> RweqConfig {
    RweqConfig {
        start_date: NaiveDate::from_ymd_opt(2018, 6, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2018, 9, 1).unwrap(),
        ..RweqConfig::default()
    }
}

fn expected_wf(n_days: f64) -> f64 {
    let et = 2e-5 * 10_800.0;
    let r = 1e-5 * 10_800.0;
    let sw = (et - r * (1.0 / n_days)) / et;
    let exc_thr = 3.0;
    let sum_wind_factor = 3.0 * 28.0;
    sw * 1.0 * (sum_wind_factor * exc_thr * 1.2) / (n_days * 9.80665)
}

fn value(frame: &RasterFrame, band: &str, row: usize, col: usize) -> f64 {
    frame.require_band(band).unwrap().get(row, col).unwrap()
}

#[test]
fn test_monthly_outputs_match_formulas() {
    let out = run(&inputs(), &config()).unwrap();

    for series in [&out.slrc, &out.wf, &out.soil_loss] {
        assert_eq!(series.keys(), vec!["2018-06", "2018-07", "2018-08"]);
    }

    let slrc = (-5.614 * 0.2f64.powf(0.7366)).exp();
    let june = out.soil_loss.find("2018-06").unwrap();
    assert_eq!(june.band_names(), vec![PRODUCT, S, QMAX, SWEP]);
    assert_eq!(june.n_days().unwrap(), 30.0);

    let wf = expected_wf(30.0);
    let june_wf = value(out.wf.find("2018-06").unwrap(), WF, 0, 0);
    let june_slrc = value(out.slrc.find("2018-06").unwrap(), SLRC, 0, 0);
    assert_relative_eq!(june_wf, wf, max_relative = 1e-9);
    assert_relative_eq!(june_slrc, slrc, max_relative = 1e-9);

    let product = wf * 0.5 * 0.8 * 0.9 * slrc;
    let s = 150.71 * product.powf(-0.3711);
    let qmax = 109.8 * product;
    let swep = (2.0 * 55.0 / (s * s)) * qmax * (-(55.0 / s).powi(2)).exp();
    assert_relative_eq!(value(june, PRODUCT, 0, 1), product, max_relative = 1e-9);
    assert_relative_eq!(value(june, S, 0, 1), s, max_relative = 1e-9);
    assert_relative_eq!(value(june, QMAX, 0, 1), qmax, max_relative = 1e-9);
    assert_relative_eq!(value(june, SWEP, 0, 1), swep, max_relative = 1e-9);

    // July has 31 days, the same samples give a different wf
    let july_wf = value(out.wf.find("2018-07").unwrap(), WF, 0, 0);
    assert_relative_eq!(july_wf, expected_wf(31.0), max_relative = 1e-9);
}

#[test]
fn test_masked_pixel_and_empty_month_stay_undefined() {
    let out = run(&inputs(), &config()).unwrap();

    let june = out.soil_loss.find("2018-06").unwrap();
    for band in [PRODUCT, S, QMAX, SWEP] {
        assert!(value(june, band, 1, 1).is_nan(), "{} at screened pixel", band);
    }
    // wf does not depend on vegetation
    assert!(!value(out.wf.find("2018-06").unwrap(), WF, 1, 1).is_nan());

    let august = out.soil_loss.find("2018-08").unwrap();
    assert_eq!(august.n_days().unwrap(), 31.0);
    assert!(august
        .require_band(SWEP)
        .unwrap()
        .data()
        .iter()
        .all(|v| v.is_nan()));
}

#[test]
fn test_study_area_clip() {
    // left column only: pixel centres at x = 0.5
    let area = StudyArea::from_geojson_str(
        r#"{ "type": "Polygon",
             "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, -2.0], [0.0, -2.0], [0.0, 0.0]]] }"#,
    )
    .unwrap();
    let mut inputs = inputs();
    inputs.study_area = Some(area);

    let out = run(&inputs, &config()).unwrap();
    let june_wf = out.wf.find("2018-06").unwrap();
    assert!(!value(june_wf, WF, 0, 0).is_nan());
    assert!(!value(june_wf, WF, 1, 0).is_nan());
    assert!(value(june_wf, WF, 0, 1).is_nan());
    assert!(value(june_wf, WF, 1, 1).is_nan());
}

#[test]
fn test_catalog_run_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = inputs();

    let write_series = |prefix: &str, series: &RasterSeries| -> Vec<String> {
        series
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let name = format!("{}_{}.tif", prefix, i);
                write_frame(frame, root.join(&name)).unwrap();
                format!(
                    r#"{{ "datetime": "{}", "path": "{}" }}"#,
                    frame.timestamp().unwrap().format("%Y-%m-%dT%H:%M:%S"),
                    name
                )
            })
            .collect()
    };
    let vegetation = write_series("veg", &source.vegetation);
    let wind = write_series("wind", &source.wind);
    let land = write_series("lis", &source.land_surface);

    let soils = RasterFrame::from_band("b8", grid(0.5)).with_band("b9", grid(0.8));
    write_frame(&soils, root.join("soils.tif")).unwrap();
    write_frame(&RasterFrame::from_band("k", grid(0.9)), root.join("k.tif")).unwrap();
    write_frame(&RasterFrame::from_band("rho", grid(1.2)), root.join("rho.tif")).unwrap();

    let json = format!(
        r#"{{ "vegetation": [{}], "wind": [{}], "land_surface": [{}],
              "statics": {{ "soils": "soils.tif", "k": "k.tif", "air_density": "rho.tif" }} }}"#,
        vegetation.join(","),
        wind.join(","),
        land.join(",")
    );
    let catalog = Catalog::from_json_str(&json, root).unwrap();
    let loaded = RweqInputs::load(&catalog).unwrap();
    assert_eq!(loaded.wind.len(), 8);

    let config = config();
    let out = run(&loaded, &config).unwrap();

    let out_dir = root.join("out");
    let pattern = &config.export.soil_loss_pattern;
    let written = export_series(&out.soil_loss, &out_dir, pattern).unwrap();
    assert_eq!(written.len(), 3);
    assert!(written[0].ends_with("windSoilLoss_2018-06.tif"));

    let back = read_frame(&written[0]).unwrap();
    assert_eq!(back.band_names(), vec![PRODUCT, S, QMAX, SWEP]);
    let direct = run(&source, &config).unwrap();
    assert_relative_eq!(
        value(&back, SWEP, 0, 0),
        value(direct.soil_loss.find("2018-06").unwrap(), SWEP, 0, 0),
        max_relative = 1e-12
    );
}
