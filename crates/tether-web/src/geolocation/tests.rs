use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use tether_core::{Dispose, Store};
use web_time::Duration;

use super::*;
use crate::host::fake::FakeHost;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct LookupFailed(&'static str);

/// Counters shared between a test and the sources its factory creates.
#[derive(Clone, Default)]
struct Probe {
    created: Rc<Cell<usize>>,
    watches: Rc<Cell<usize>>,
    unwatched: Rc<Cell<usize>>,
    emitters: Rc<RefCell<Vec<PositionCallback>>>,
    error_sinks: Rc<RefCell<Vec<ErrorCallback<GeolocationError>>>>,
}

impl Probe {
    fn emit(&self, latitude: f64, longitude: f64) {
        let emitters = self.emitters.borrow().clone();
        for emit in emitters {
            emit(Position::now(latitude, longitude));
        }
    }

    fn fail(&self, reason: &'static str) {
        let sinks = self.error_sinks.borrow().clone();
        for sink in sinks {
            sink(GeolocationError::provider(LookupFailed(reason)));
        }
    }
}

struct Scripted {
    fix: Option<(f64, f64)>,
    watchable: bool,
    probe: Probe,
}

impl PositionSource for Scripted {
    fn get_current_position(&self) -> LocalBoxFuture<'static, Result<Position, GeolocationError>> {
        let result = match self.fix {
            Some((lat, lon)) => Ok(Position::now(lat, lon)),
            None => Err(GeolocationError::provider(LookupFailed("ip lookup failed"))),
        };
        Box::pin(async move { result })
    }

    fn watch_position(
        &self,
        on_position: PositionCallback,
        on_error: ErrorCallback<GeolocationError>,
    ) -> Result<Dispose, GeolocationError> {
        if !self.watchable {
            return Err(PositionError::permission_denied("watch refused").into());
        }
        self.probe.watches.set(self.probe.watches.get() + 1);
        self.probe.emitters.borrow_mut().push(on_position);
        self.probe.error_sinks.borrow_mut().push(on_error);
        let unwatched = self.probe.unwatched.clone();
        Ok(Dispose::new(move || unwatched.set(unwatched.get() + 1)))
    }
}

fn scripted(fix: Option<(f64, f64)>, watchable: bool, probe: &Probe) -> Provider {
    let probe = probe.clone();
    Provider::custom(move |_| {
        probe.created.set(probe.created.get() + 1);
        Rc::new(Scripted {
            fix,
            watchable,
            probe: probe.clone(),
        })
    })
}

fn config(providers: impl Into<Providers>) -> GeolocationConfig {
    GeolocationConfig::default()
        .with_host(FakeHost::new())
        .with_providers(providers)
}

fn failures(geo: &Geolocation) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _ = geo
        .reporting
        .failed
        .watch(move |err| sink.borrow_mut().push(err.to_string()));
    seen
}

#[derive(Default)]
struct FakeNative {
    fix: Option<(f64, f64)>,
    next_id: Cell<i32>,
    cleared: RefCell<Vec<i32>>,
    last_params: Cell<Option<GeolocationParams>>,
    error_sinks: RefCell<Vec<ErrorCallback<PositionError>>>,
}

impl FakeNative {
    fn fail(&self, err: PositionError) {
        let sinks = self.error_sinks.borrow().clone();
        for sink in sinks {
            sink(err.clone());
        }
    }
}

impl NativeGeolocation for FakeNative {
    fn get_current_position(
        &self,
        params: &GeolocationParams,
    ) -> LocalBoxFuture<'static, Result<Position, PositionError>> {
        self.last_params.set(Some(*params));
        let result = match self.fix {
            Some((lat, lon)) => Ok(Position::now(lat, lon)),
            None => Err(PositionError::timeout("Timeout expired")),
        };
        Box::pin(async move { result })
    }

    fn watch_position(
        &self,
        _on_position: PositionCallback,
        on_error: ErrorCallback<PositionError>,
        params: &GeolocationParams,
    ) -> Result<i32, PositionError> {
        self.last_params.set(Some(*params));
        self.error_sinks.borrow_mut().push(on_error);
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        Ok(id)
    }

    fn clear_watch(&self, id: i32) {
        self.cleared.borrow_mut().push(id);
    }
}

#[test]
fn test_custom_provider_sets_location() {
    let probe = Probe::default();
    let geo = track_geolocation(config(vec![scripted(Some((41.89, 12.49)), true, &probe)]));

    assert_eq!(geo.location.get(), None);
    let location = block_on(geo.request()).unwrap();

    assert_eq!(location, Location { latitude: 41.89, longitude: 12.49 });
    assert_eq!(geo.latitude.get(), Some(41.89));
    assert_eq!(geo.longitude.get(), Some(12.49));
}

#[test]
fn test_last_successful_provider_wins() {
    let probe = Probe::default();
    let geo = track_geolocation(config(vec![
        scripted(Some((1.0, 1.0)), true, &probe),
        scripted(Some((2.0, 2.0)), true, &probe),
    ]));

    let updates = Rc::new(Cell::new(0));
    let counter = updates.clone();
    let _ = geo.location.updates().watch(move |_| counter.set(counter.get() + 1));

    block_on(geo.request()).unwrap();

    assert_eq!(geo.location.get(), Some(Location { latitude: 2.0, longitude: 2.0 }));
    assert_eq!(updates.get(), 1);

    let reversed = track_geolocation(config(vec![
        scripted(Some((2.0, 2.0)), true, &probe),
        scripted(Some((1.0, 1.0)), true, &probe),
    ]));
    block_on(reversed.request()).unwrap();
    assert_eq!(reversed.location.get(), Some(Location { latitude: 1.0, longitude: 1.0 }));
}

#[test]
fn test_partial_failure_reports_each_error_in_order() {
    let probe = Probe::default();
    let geo = track_geolocation(config(vec![
        scripted(None, true, &probe),
        Provider::native(Rc::new(FakeNative::default())),
        scripted(Some((2.0, 2.0)), true, &probe),
    ]));
    let failed = failures(&geo);

    let result = block_on(geo.request());

    assert!(result.is_ok());
    insta::assert_snapshot!(
        failed.borrow().join("\n"),
        @r"
    geolocation provider failed: ip lookup failed
    TIMEOUT: Timeout expired
    "
    );
    assert_eq!(geo.location.get(), Some(Location { latitude: 2.0, longitude: 2.0 }));
}

#[test]
fn test_all_providers_failing_is_position_unavailable() {
    let probe = Probe::default();
    let geo = track_geolocation(config(vec![
        scripted(None, true, &probe),
        scripted(None, true, &probe),
    ]));
    let failed = failures(&geo);

    let err = block_on(geo.request()).unwrap_err();

    assert_eq!(err.code(), Some(PositionErrorCode::PositionUnavailable));
    insta::assert_snapshot!(
        failed.borrow().join("\n"),
        @r"
    geolocation provider failed: ip lookup failed
    geolocation provider failed: ip lookup failed
    POSITION_UNAVAILABLE: no geolocation provider returned a position
    "
    );
    assert_eq!(geo.location.get(), None);
}

#[test]
fn test_custom_errors_pass_through_untouched() {
    let probe = Probe::default();
    let geo = track_geolocation(config(vec![scripted(None, true, &probe)]));

    let first = Rc::new(RefCell::new(None));
    let sink = first.clone();
    let _ = geo.reporting.failed.watch(move |err| {
        sink.borrow_mut().get_or_insert_with(|| err.clone());
    });

    let _ = block_on(geo.request());

    let first = first.borrow().clone().unwrap();
    assert!(matches!(first, GeolocationError::Provider(_)));
    assert_eq!(first.code(), None);
}

#[test]
fn test_factories_run_once_across_requests() {
    let probe = Probe::default();
    let geo = track_geolocation(config(vec![scripted(Some((0.0, 0.0)), true, &probe)]));

    assert_eq!(geo.phase(), EnginePhase::Uninitialized);
    assert_eq!(probe.created.get(), 0);

    block_on(geo.request()).unwrap();
    block_on(geo.request()).unwrap();

    assert_eq!(geo.phase(), EnginePhase::Ready);
    assert_eq!(probe.created.get(), 1);
}

#[test]
fn test_watching_delivers_positions_until_stopped() {
    let probe = Probe::default();
    let geo = track_geolocation(config(vec![scripted(Some((0.0, 0.0)), true, &probe)]));

    geo.watching.start.fire(());
    assert!(geo.watching.active.get());

    probe.emit(52.52, 13.40);
    assert_eq!(geo.location.get(), Some(Location { latitude: 52.52, longitude: 13.40 }));

    geo.watching.start.fire(());
    assert_eq!(probe.watches.get(), 1);

    geo.watching.stop.fire(());
    assert!(!geo.watching.active.get());
    assert_eq!(probe.unwatched.get(), 1);

    probe.emit(0.5, 0.5);
    assert_eq!(geo.location.get(), Some(Location { latitude: 52.52, longitude: 13.40 }));

    geo.watching.stop.fire(());
    assert_eq!(probe.unwatched.get(), 1);
}

#[test]
fn test_stop_without_start_is_harmless() {
    let probe = Probe::default();
    let geo = track_geolocation(config(vec![scripted(Some((0.0, 0.0)), true, &probe)]));

    geo.watching.stop.fire(());

    assert!(!geo.watching.active.get());
    assert_eq!(probe.created.get(), 0);
}

#[test]
fn test_broken_watch_does_not_stop_other_providers() {
    let broken = Probe::default();
    let working = Probe::default();
    let geo = track_geolocation(config(vec![
        scripted(Some((0.0, 0.0)), false, &broken),
        scripted(Some((0.0, 0.0)), true, &working),
    ]));
    let failed = failures(&geo);

    geo.watching.start.fire(());

    assert!(geo.watching.active.get());
    assert_eq!(working.watches.get(), 1);
    insta::assert_snapshot!(failed.borrow().join("\n"), @"PERMISSION_DENIED: watch refused");

    working.emit(1.5, 2.5);
    assert_eq!(geo.latitude.get(), Some(1.5));
}

#[test]
fn test_reactive_providers_reinitialize_on_change() {
    let first = Probe::default();
    let second = Probe::default();
    let providers = Store::new(vec![scripted(Some((1.0, 1.0)), true, &first)]);
    let geo = track_geolocation(config(providers.clone()));

    block_on(geo.request()).unwrap();
    assert_eq!(geo.phase(), EnginePhase::Ready);

    providers.set(vec![scripted(Some((2.0, 2.0)), true, &second)]);
    assert_eq!(geo.phase(), EnginePhase::Uninitialized);

    block_on(geo.request()).unwrap();
    assert_eq!(geo.latitude.get(), Some(2.0));
    assert_eq!(first.created.get(), 1);
    assert_eq!(second.created.get(), 1);
}

#[test]
fn test_missing_browser_geolocation_is_skipped() {
    let geo = track_geolocation(GeolocationConfig::default().with_host(FakeHost::new()));
    let failed = failures(&geo);

    let err = block_on(geo.request()).unwrap_err();

    assert_eq!(err.code(), Some(PositionErrorCode::PositionUnavailable));
    assert_eq!(failed.borrow().len(), 1);
}

#[test]
fn test_browser_provider_uses_host_geolocation() {
    let _ = env_logger::builder().is_test(true).try_init();
    let host = FakeHost::new();
    let native = Rc::new(FakeNative {
        fix: Some((35.68, 139.69)),
        ..FakeNative::default()
    });
    *host.geolocation.borrow_mut() = Some(native.clone() as Rc<dyn NativeGeolocation>);

    let params = GeolocationParams::default()
        .timeout(Duration::from_secs(5))
        .high_accuracy();
    let geo = track_geolocation(
        GeolocationConfig::default()
            .with_host(host)
            .with_params(params),
    );

    block_on(geo.request()).unwrap();
    assert_eq!(geo.longitude.get(), Some(139.69));
    assert_eq!(native.last_params.get(), Some(params));

    geo.watching.start.fire(());
    geo.watching.stop.fire(());
    assert_eq!(*native.cleared.borrow(), vec![1]);
}

#[test]
fn test_native_errors_keep_their_code() {
    let native = Rc::new(FakeNative::default());
    let fallback = Probe::default();
    let geo = track_geolocation(config(vec![
        scripted(Some((3.0, 4.0)), true, &fallback),
        Provider::native(native),
    ]));
    let codes = Rc::new(RefCell::new(Vec::new()));
    let sink = codes.clone();
    let _ = geo
        .reporting
        .failed
        .watch(move |err| sink.borrow_mut().push(err.code()));

    block_on(geo.request()).unwrap();

    assert_eq!(*codes.borrow(), vec![Some(PositionErrorCode::Timeout)]);
    assert_eq!(geo.location.get(), Some(Location { latitude: 3.0, longitude: 4.0 }));
}

#[test]
fn test_watch_errors_are_reported_until_stopped() {
    let probe = Probe::default();
    let native = Rc::new(FakeNative::default());
    let geo = track_geolocation(config(vec![
        Provider::native(native.clone()),
        scripted(Some((0.0, 0.0)), true, &probe),
    ]));
    let failed = failures(&geo);

    geo.watching.start.fire(());
    native.fail(PositionError::permission_denied("denied"));
    probe.fail("signal lost");

    geo.watching.stop.fire(());
    native.fail(PositionError::timeout("late"));
    probe.fail("late");

    insta::assert_snapshot!(
        failed.borrow().join("\n"),
        @r"
    PERMISSION_DENIED: denied
    geolocation provider failed: signal lost
    "
    );
    assert_eq!(*native.cleared.borrow(), vec![1]);
    assert_eq!(probe.unwatched.get(), 1);
}
