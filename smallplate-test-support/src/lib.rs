//! Shared test utilities used across smallplate crates.

pub mod fs {
    //! Temporary file fixtures.
    use std::io;
    use std::path::PathBuf;

    use tempfile::TempDir;

    /// Creates a fresh temporary directory, panicking when the OS refuses.
    ///
    /// # Panics
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn temp_dir() -> TempDir {
        match TempDir::new() {
            Ok(dir) => dir,
            Err(err) => panic!("failed to create temp dir: {err}"),
        }
    }

    /// Writes `contents` to `name` inside `dir` and returns the full path.
    ///
    /// # Errors
    /// Returns any I/O error raised while writing the file.
    ///
    /// # Examples
    /// ```
    /// use smallplate_test_support::fs::{temp_dir, write_file};
    ///
    /// let dir = temp_dir();
    /// let path = write_file(&dir, "rows.csv", "name\nAlice\n")?;
    /// assert_eq!(std::fs::read_to_string(path)?, "name\nAlice\n");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

pub mod tracing {
    //! A subscriber layer that records spans and events for assertions.
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex, MutexGuard};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::registry::LookupSpan;

    /// Captured span or event fields, rendered as strings.
    pub type Fields = HashMap<String, String>;

    /// A span recorded when it closed.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name from its metadata.
        pub name: String,
        /// Fields recorded at creation and through `Span::record`.
        pub fields: Fields,
    }

    impl SpanRecord {
        /// Returns the recorded value of `name`, if any.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }
    }

    /// An emitted event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Event level.
        pub level: Level,
        /// Event fields, including `message`.
        pub fields: Fields,
    }

    impl EventRecord {
        /// Returns the recorded value of `name`, if any.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }

        /// Returns the event message, if any.
        #[must_use]
        pub fn message(&self) -> Option<&str> {
            self.field("message")
        }
    }

    #[derive(Default)]
    struct Recording {
        spans: Vec<SpanRecord>,
        events: Vec<EventRecord>,
    }

    /// Layer that records closed spans and emitted events.
    ///
    /// Clone the layer before installing it; every clone shares one recording.
    ///
    /// # Examples
    /// ```
    /// use smallplate_test_support::tracing::RecordingLayer;
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let layer = RecordingLayer::default();
    /// let subscriber = tracing_subscriber::registry().with(layer.clone());
    /// tracing::subscriber::with_default(subscriber, || tracing::info!(rows = 3, "loaded"));
    /// let events = layer.events();
    /// assert_eq!(events[0].message(), Some("loaded"));
    /// assert_eq!(events[0].field("rows"), Some("3"));
    /// ```
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        recording: Arc<Mutex<Recording>>,
    }

    impl RecordingLayer {
        fn lock(&self) -> MutexGuard<'_, Recording> {
            match self.recording.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }

        /// Closed spans in completion order.
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            self.lock().spans.clone()
        }

        /// The first closed span called `name`.
        #[must_use]
        pub fn span(&self, name: &str) -> Option<SpanRecord> {
            self.lock().spans.iter().find(|span| span.name == name).cloned()
        }

        /// Emitted events in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            self.lock().events.clone()
        }

        /// Emitted events at exactly `level`.
        #[must_use]
        pub fn events_at(&self, level: Level) -> Vec<EventRecord> {
            self.lock()
                .events
                .iter()
                .filter(|event| event.level == level)
                .cloned()
                .collect()
        }
    }

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut record = SpanRecord {
                name: attrs.metadata().name().to_owned(),
                fields: Fields::new(),
            };
            attrs.record(&mut FieldVisitor(&mut record.fields));
            span.extensions_mut().insert(record);
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            if let Some(record) = span.extensions_mut().get_mut::<SpanRecord>() {
                values.record(&mut FieldVisitor(&mut record.fields));
            }
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            let Some(record) = span.extensions_mut().remove::<SpanRecord>() else {
                return;
            };
            self.lock().spans.push(record);
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = Fields::new();
            event.record(&mut FieldVisitor(&mut fields));
            self.lock().events.push(EventRecord {
                level: *event.metadata().level(),
                fields,
            });
        }
    }

    struct FieldVisitor<'a>(&'a mut Fields);

    impl Visit for FieldVisitor<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_owned(), value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_owned(), format!("{value:?}"));
        }
    }
}
