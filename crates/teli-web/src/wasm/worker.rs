use super::{describe, log, warn};
use crate::PageConfig;
use js_sys::Array;
use std::rc::Rc;
use teli_core::offline::OfflinePlan;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{Cache, ExtendableEvent, FetchEvent, Request, ServiceWorkerGlobalScope};

pub(crate) fn init(scope: ServiceWorkerGlobalScope) -> Result<(), JsValue> {
    let config = PageConfig::for_worker(&scope.location().href());
    let plan = Rc::new(config.offline_plan());

    let on_install = {
        let scope = scope.clone();
        let plan = plan.clone();
        Closure::<dyn FnMut(ExtendableEvent)>::new(move |event: ExtendableEvent| {
            let scope = scope.clone();
            let plan = plan.clone();
            let work = future_to_promise(async move {
                install(&scope, &plan).await.map_err(|e| {
                    warn(&format!("teli: offline cache install failed: {}", describe(&e)));
                    e
                })?;
                Ok(JsValue::UNDEFINED)
            });
            let _ = event.wait_until(&work);
        })
    };
    scope.set_oninstall(Some(on_install.as_ref().unchecked_ref()));
    on_install.forget();

    let on_activate = {
        let scope = scope.clone();
        let plan = plan.clone();
        Closure::<dyn FnMut(ExtendableEvent)>::new(move |event: ExtendableEvent| {
            let scope = scope.clone();
            let plan = plan.clone();
            let work = future_to_promise(async move {
                activate(&scope, &plan).await.map_err(|e| {
                    warn(&format!("teli: offline cache cleanup failed: {}", describe(&e)));
                    e
                })?;
                Ok(JsValue::UNDEFINED)
            });
            let _ = event.wait_until(&work);
        })
    };
    scope.set_onactivate(Some(on_activate.as_ref().unchecked_ref()));
    on_activate.forget();

    let on_fetch = {
        let scope = scope.clone();
        Closure::<dyn FnMut(FetchEvent)>::new(move |event: FetchEvent| {
            let request = event.request();
            if !OfflinePlan::intercepts(&request.method()) {
                return;
            }
            let response = future_to_promise(network_first(scope.clone(), request));
            if let Err(e) = event.respond_with(&response) {
                warn(&format!("teli: could not answer fetch: {}", describe(&e)));
            }
        })
    };
    scope.set_onfetch(Some(on_fetch.as_ref().unchecked_ref()));
    on_fetch.forget();

    log(&format!("teli: service worker ready for {}", plan.version()));
    Ok(())
}

/// Precache the assets, then take over without waiting for old pages to close
async fn install(scope: &ServiceWorkerGlobalScope, plan: &OfflinePlan) -> Result<(), JsValue> {
    let caches = scope.caches()?;
    let cache: Cache = JsFuture::from(caches.open(plan.version()))
        .await?
        .dyn_into()?;

    let assets: Array = plan.assets().iter().map(|a| JsValue::from_str(a)).collect();
    JsFuture::from(cache.add_all_with_str_sequence(&assets)).await?;
    JsFuture::from(scope.skip_waiting()?).await?;

    log(&format!(
        "teli: cached {} assets in {}",
        plan.assets().len(),
        plan.version()
    ));
    Ok(())
}

async fn activate(scope: &ServiceWorkerGlobalScope, plan: &OfflinePlan) -> Result<(), JsValue> {
    let caches = scope.caches()?;
    let keys: Array = JsFuture::from(caches.keys()).await?.dyn_into()?;
    let names: Vec<String> = keys.iter().filter_map(|k| k.as_string()).collect();

    for name in plan.stale_caches(&names) {
        JsFuture::from(caches.delete(&name)).await?;
        log(&format!("teli: deleted stale cache {}", name));
    }
    Ok(())
}

/// The network's answer whenever there is one; the cached copy only when the
/// request itself fails
async fn network_first(scope: ServiceWorkerGlobalScope, request: Request) -> Result<JsValue, JsValue> {
    let network_error = match JsFuture::from(scope.fetch_with_request(&request)).await {
        Ok(response) => return Ok(response),
        Err(e) => e,
    };

    let cached = JsFuture::from(scope.caches()?.match_with_request(&request)).await?;
    if cached.is_undefined() {
        Err(network_error)
    } else {
        Ok(cached)
    }
}
