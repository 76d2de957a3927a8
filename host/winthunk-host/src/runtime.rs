use std::{fmt, sync::Arc};

use anyhow::Context as _;
use thunklink::{
    Dispatcher, DispatcherBuilder, SharedRegion, direct::DirectGate, gate::Gate,
};
use thunklink_worker::WorkerGate;

use crate::{
    config::{HostConfig, TransportKind},
    d3d11::{self, D3d10QueryApi, D3d11QueryApi},
    user32::{self, DisplayApi, ImeApi, NotificationApi, SystemApi, TouchApi},
};

// === HostRuntimeBuilder === //

type Registration = Box<dyn FnOnce(DispatcherBuilder) -> DispatcherBuilder>;

/// Collects the native areas a host provides. Areas that are never registered leave their call
/// ids unknown.
pub struct HostRuntimeBuilder {
    config: HostConfig,
    areas: Vec<(&'static str, Registration)>,
}

impl fmt::Debug for HostRuntimeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRuntimeBuilder")
            .field("config", &self.config)
            .field(
                "areas",
                &self.areas.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl HostRuntimeBuilder {
    fn area(
        mut self,
        name: &'static str,
        register: impl FnOnce(DispatcherBuilder) -> DispatcherBuilder + 'static,
    ) -> Self {
        self.areas.push((name, Box::new(register)));
        self
    }

    pub fn display(self, api: Arc<impl DisplayApi + 'static>) -> Self {
        self.area("display", move |b| user32::bind_display(b, &api))
    }

    pub fn notifications(self, api: Arc<impl NotificationApi + 'static>) -> Self {
        self.area("notifications", move |b| user32::bind_notifications(b, &api))
    }

    pub fn ime(self, api: Arc<impl ImeApi + 'static>) -> Self {
        self.area("ime", move |b| user32::bind_ime(b, &api))
    }

    pub fn touch(self, api: Arc<impl TouchApi + 'static>) -> Self {
        self.area("touch", move |b| user32::bind_touch(b, &api))
    }

    pub fn system(self, api: Arc<impl SystemApi + 'static>) -> Self {
        self.area("system", move |b| user32::bind_system(b, &api))
    }

    pub fn d3d11_queries(self, api: Arc<impl D3d11QueryApi + 'static>) -> Self {
        self.area("d3d11-query", move |b| d3d11::bind_d3d11_query(b, &api))
    }

    pub fn d3d10_queries(self, api: Arc<impl D3d10QueryApi + 'static>) -> Self {
        self.area("d3d10-query", move |b| d3d11::bind_d3d10_query(b, &api))
    }

    pub fn build(self) -> anyhow::Result<HostRuntime> {
        self.config
            .validate()
            .context("refusing to start the host with an invalid configuration")?;

        let region = self.config.region()?;

        let mut builder =
            Dispatcher::builder().unverified_warnings(self.config.diagnostics.unverified_warnings);

        for (name, register) in self.areas {
            tracing::debug!(area = name, "registering native area");
            builder = register(builder);
        }

        let dispatcher = Arc::new(builder.build());

        tracing::info!(
            calls = dispatcher.len(),
            base = region.base(),
            size = region.size(),
            width = region.width().bits(),
            transport = ?self.config.transport.kind,
            "host runtime ready"
        );

        Ok(HostRuntime {
            config: self.config,
            region,
            dispatcher,
        })
    }
}

// === HostRuntime === //

#[derive(Debug)]
pub struct HostRuntime {
    config: HostConfig,
    region: SharedRegion,
    dispatcher: Arc<Dispatcher>,
}

impl HostRuntime {
    pub fn builder(config: HostConfig) -> HostRuntimeBuilder {
        HostRuntimeBuilder {
            config,
            areas: Vec::new(),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Creates a gate of the configured transport over this runtime's dispatcher. Each call
    /// returns an independent gate.
    pub fn gate(&self) -> Arc<dyn Gate> {
        let depth = self.config.transport.max_callback_depth;

        match self.config.transport.kind {
            TransportKind::Direct => Arc::new(DirectGate::new(
                self.dispatcher.clone(),
                self.region,
                depth,
            )),
            TransportKind::Worker => Arc::new(WorkerGate::new(
                self.dispatcher.clone(),
                self.region,
                depth,
            )),
        }
    }
}
