//! # Cauldron
//!
//! `Cauldron` is the data access API over a Cauldron repository. It composes
//! the versioned working copy, the JSON document, the binary and source map
//! blob stores, and an optional manifest provider.
//!
//! ## Usage
//!
//! ```no_run
//! use cauldron::cauldron::Cauldron;
//! use cauldron::descriptor::NativeApplicationDescriptor;
//! use cauldron::dependency::Dependency;
//! use cauldron::repository::StoreSettings;
//!
//! # fn main() -> cauldron::error::Result<()> {
//! let settings = StoreSettings {
//!     repository: "git@github.com:org/cauldron.git".to_string(),
//!     branch: "master".to_string(),
//!     path: "/tmp/cauldron".into(),
//! };
//! let mut cauldron = Cauldron::open(&settings)?;
//! let descriptor: NativeApplicationDescriptor = "MyApp:android:1.0.0".parse()?;
//! let dependency: Dependency = "react-native@0.40.0".parse()?;
//!
//! cauldron.with_transaction("Add react-native to MyApp:android:1.0.0", |c| {
//!     c.add_native_app(&descriptor, "10")?;
//!     c.add_native_dependency(&descriptor, &dependency)
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Contracts
//!
//! - Mutations are applied to the working copy only. They become durable when
//!   the caller commits the transaction; the facade does not check that one
//!   is open.
//! - Every mutation validates its input, and the whole document, before
//!   writing. A failed call leaves the working copy untouched.
//! - Dependencies and container mini-apps of a released version cannot be
//!   added, removed or updated.
//! - Creation is an idempotent upsert: creating an existing node leaves it
//!   untouched and returns `false`.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde_json::Value;

use crate::blob::{BlobKind, FileStore};
use crate::dependency::Dependency;
use crate::descriptor::{NativeApplicationDescriptor, VersionCoordinates};
use crate::document::{self, describe, CauldronDocument, ManifestOverrides};
use crate::error::{Error, Result};
use crate::manifest::ManifestProvider;
use crate::repository::{StoreSettings, VersionedRepository};
use crate::schema::{
    validate_container_version, NativeApplication, NativeApplicationPlatform,
    NativeApplicationVersion, Platform, Validate, VersionPatch,
};
use crate::transaction::{CommitMessage, Transactional};

/// A node of the hierarchy, as addressed by a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeAppNode {
    Application(NativeApplication),
    Platform(NativeApplicationPlatform),
    Version(NativeApplicationVersion),
}

/// Handle on one Cauldron.
pub struct Cauldron {
    repo: VersionedRepository,
    binaries: FileStore,
    source_maps: FileStore,
    manifest: Option<Box<dyn ManifestProvider>>,
}

impl Cauldron {
    pub fn new(repo: VersionedRepository) -> Self {
        Self {
            repo,
            binaries: FileStore::new(BlobKind::Binary),
            source_maps: FileStore::new(BlobKind::SourceMap),
            manifest: None,
        }
    }

    /// Open the Cauldron described by `settings` with the system `git`.
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        Ok(Self::new(VersionedRepository::new(settings)?))
    }

    /// Use `manifest` to resolve dependencies added without a version.
    pub fn with_manifest(mut self, manifest: Box<dyn ManifestProvider>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn repository(&self) -> &VersionedRepository {
        &self.repo
    }

    /// Sync the working copy now rather than on first access.
    pub fn sync(&mut self) -> Result<()> {
        self.repo.sync()
    }

    /// Run `f` in a transaction: commit with `message` when it succeeds,
    /// discard when it (or the commit) fails.
    pub fn with_transaction<T, F>(&mut self, message: impl Into<CommitMessage>, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.with_transaction_described(f, |_| message.into())
    }

    /// [`Cauldron::with_transaction`] with a commit message built from what
    /// `f` returned.
    pub fn with_transaction_described<T, F, D>(&mut self, f: F, describe: D) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
        D: FnOnce(&T) -> CommitMessage,
    {
        self.begin_transaction()?;
        let result = f(self).and_then(|value| {
            self.commit_transaction(describe(&value))?;
            Ok(value)
        });
        if result.is_err() && self.repo.is_pending() {
            if let Err(e) = self.discard_transaction() {
                warn!("[cauldron] Failed to discard transaction: {}", e);
            }
        }
        result
    }

    fn load(&mut self) -> Result<CauldronDocument> {
        self.repo.sync()?;
        document::load(self.repo.path())
    }

    fn save(&self, doc: &CauldronDocument) -> Result<()> {
        document::save(self.repo.path(), doc)
    }

    // ------------------------------------------------------------------
    // Applications, platforms, versions
    // ------------------------------------------------------------------

    /// Returns `false` when the application already exists.
    pub fn create_native_application(&mut self, name: &str) -> Result<bool> {
        NativeApplication::new(name).validate()?;
        let mut doc = self.load()?;
        if doc.native_apps.iter().any(|a| a.name == name) {
            debug!("[cauldron] {} already exists", name);
            return Ok(false);
        }
        doc.native_apps.push(NativeApplication::new(name));
        self.save(&doc)?;
        info!("[cauldron] Created native application {}", name);
        Ok(true)
    }

    /// Returns `false` when the platform already exists.
    pub fn create_platform(&mut self, name: &str, platform: Platform) -> Result<bool> {
        let mut doc = self.load()?;
        let app = doc.app_mut(name)?;
        if app.platform(platform).is_some() {
            debug!("[cauldron] {}:{} already exists", name, platform);
            return Ok(false);
        }
        app.platforms.push(NativeApplicationPlatform::new(platform));
        self.save(&doc)?;
        info!("[cauldron] Created platform {}:{}", name, platform);
        Ok(true)
    }

    /// Returns `false` when a version with the same name already exists.
    pub fn create_version(
        &mut self,
        name: &str,
        platform: Platform,
        version: NativeApplicationVersion,
    ) -> Result<bool> {
        version.validate()?;
        let mut doc = self.load()?;
        let entry = doc.platform_mut(name, platform)?;
        if entry.version(&version.name).is_some() {
            debug!(
                "[cauldron] {}:{}:{} already exists",
                name, platform, version.name
            );
            return Ok(false);
        }
        let version_name = version.name.clone();
        entry.versions.push(version);
        self.save(&doc)?;
        info!(
            "[cauldron] Created version {}:{}:{}",
            name, platform, version_name
        );
        Ok(true)
    }

    pub fn remove_native_application(&mut self, name: &str) -> Result<()> {
        let mut doc = self.load()?;
        doc.app(name)?;
        doc.native_apps.retain(|a| a.name != name);
        self.save(&doc)?;
        info!("[cauldron] Removed native application {}", name);
        Ok(())
    }

    pub fn remove_platform(&mut self, name: &str, platform: Platform) -> Result<()> {
        let mut doc = self.load()?;
        doc.platform(name, platform)?;
        doc.app_mut(name)?
            .platforms
            .retain(|p| p.name != platform.as_str());
        self.save(&doc)?;
        info!("[cauldron] Removed platform {}:{}", name, platform);
        Ok(())
    }

    pub fn remove_version(&mut self, name: &str, platform: Platform, version: &str) -> Result<()> {
        let mut doc = self.load()?;
        let coords = VersionCoordinates {
            name,
            platform,
            version,
        };
        doc.version(coords)?;
        doc.platform_mut(name, platform)?
            .versions
            .retain(|v| v.name != version);
        self.save(&doc)?;
        info!("[cauldron] Removed version {}", describe(coords));
        Ok(())
    }

    pub fn get_native_applications(&mut self) -> Result<Vec<NativeApplication>> {
        Ok(self.load()?.native_apps)
    }

    pub fn get_native_application(&mut self, name: &str) -> Result<NativeApplication> {
        Ok(self.load()?.app(name)?.clone())
    }

    pub fn get_platform(
        &mut self,
        name: &str,
        platform: Platform,
    ) -> Result<NativeApplicationPlatform> {
        Ok(self.load()?.platform(name, platform)?.clone())
    }

    pub fn get_version(
        &mut self,
        name: &str,
        platform: Platform,
        version: &str,
    ) -> Result<NativeApplicationVersion> {
        let coords = VersionCoordinates {
            name,
            platform,
            version,
        };
        Ok(self.load()?.version(coords)?.clone())
    }

    // ------------------------------------------------------------------
    // Descriptor-level operations
    // ------------------------------------------------------------------

    /// Create every node the descriptor reaches, leaving existing ones alone.
    ///
    /// `ern_platform_version` is only used when a new version is created.
    pub fn add_native_app(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        ern_platform_version: &str,
    ) -> Result<()> {
        self.create_native_application(&descriptor.name)?;
        if let Some(platform) = descriptor.platform {
            self.create_platform(&descriptor.name, platform)?;
            if let Some(version) = &descriptor.version {
                self.create_version(
                    &descriptor.name,
                    platform,
                    NativeApplicationVersion::new(version.as_str(), ern_platform_version),
                )?;
            }
        }
        Ok(())
    }

    /// Remove the node the descriptor addresses, with everything below it.
    pub fn remove_native_app(&mut self, descriptor: &NativeApplicationDescriptor) -> Result<()> {
        match (descriptor.platform, descriptor.version.as_deref()) {
            (None, _) => self.remove_native_application(&descriptor.name),
            (Some(platform), None) => self.remove_platform(&descriptor.name, platform),
            (Some(platform), Some(version)) => {
                self.remove_version(&descriptor.name, platform, version)
            }
        }
    }

    /// The node the descriptor addresses.
    pub fn get_native_app(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
    ) -> Result<NativeAppNode> {
        match (descriptor.platform, descriptor.version.as_deref()) {
            (None, _) => self
                .get_native_application(&descriptor.name)
                .map(NativeAppNode::Application),
            (Some(platform), None) => self
                .get_platform(&descriptor.name, platform)
                .map(NativeAppNode::Platform),
            (Some(platform), Some(version)) => self
                .get_version(&descriptor.name, platform, version)
                .map(NativeAppNode::Version),
        }
    }

    /// Complete descriptors of every version not yet released.
    pub fn non_released_versions(&mut self) -> Result<Vec<NativeApplicationDescriptor>> {
        let doc = self.load()?;
        let mut descriptors = Vec::new();
        for app in &doc.native_apps {
            for platform in &app.platforms {
                let Ok(platform_name) = platform.name.parse::<Platform>() else {
                    continue;
                };
                for version in platform.versions.iter().filter(|v| !v.is_released) {
                    descriptors.push(NativeApplicationDescriptor::version(
                        app.name.as_str(),
                        platform_name,
                        version.name.as_str(),
                    ));
                }
            }
        }
        Ok(descriptors)
    }

    // ------------------------------------------------------------------
    // Native dependencies
    // ------------------------------------------------------------------

    /// Add a native dependency to a version, resolving a missing version
    /// from the manifest. Returns the dependency as recorded.
    pub fn add_native_dependency(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        dependency: &Dependency,
    ) -> Result<Dependency> {
        let coords = descriptor.require_complete()?;
        let mut doc = self.load()?;
        let ern_platform_version =
            mutable_version(&mut doc, coords, "Cannot add a native dependency")?
                .ern_platform_version
                .clone();
        let resolved = self.resolve_native_dependency(&doc, &ern_platform_version, dependency)?;

        let version = doc.version_mut(coords)?;
        if insert_unique(&mut version.native_deps, &resolved, "native dependency", coords)? {
            self.save(&doc)?;
            info!(
                "[cauldron] Added native dependency {} to {}",
                resolved,
                describe(coords)
            );
        }
        Ok(resolved)
    }

    pub fn remove_native_dependency(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        dependency: &Dependency,
    ) -> Result<()> {
        let coords = descriptor.require_complete()?;
        let mut doc = self.load()?;
        let version = mutable_version(&mut doc, coords, "Cannot remove a native dependency")?;
        let removed = remove_existing(
            &mut version.native_deps,
            dependency,
            "native dependency",
            coords,
        )?;
        self.save(&doc)?;
        info!(
            "[cauldron] Removed native dependency {} from {}",
            removed,
            describe(coords)
        );
        Ok(())
    }

    /// Replace the version of a native dependency already present.
    pub fn update_native_dependency(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        dependency: &Dependency,
    ) -> Result<()> {
        let coords = descriptor.require_complete()?;
        require_version(dependency, "nativeDeps")?;
        let mut doc = self.load()?;
        let version = mutable_version(&mut doc, coords, "Cannot update a native dependency")?;
        replace_existing(
            &mut version.native_deps,
            dependency,
            "native dependency",
            coords,
        )?;
        self.save(&doc)?;
        info!(
            "[cauldron] Updated native dependency {} in {}",
            dependency,
            describe(coords)
        );
        Ok(())
    }

    pub fn get_native_dependencies(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
    ) -> Result<Vec<Dependency>> {
        let coords = descriptor.require_complete()?;
        Ok(self.load()?.version(coords)?.native_deps.clone())
    }

    /// The native dependency named `name` (`[@scope/]name`).
    pub fn get_native_dependency(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        name: &str,
    ) -> Result<Dependency> {
        let coords = descriptor.require_complete()?;
        let doc = self.load()?;
        find_package(&doc.version(coords)?.native_deps, name, "native dependency", coords)
    }

    fn resolve_native_dependency(
        &self,
        doc: &CauldronDocument,
        ern_platform_version: &str,
        dependency: &Dependency,
    ) -> Result<Dependency> {
        let targets = self
            .manifest
            .as_ref()
            .and_then(|m| m.get_target_native_and_js_dependencies(ern_platform_version));

        if dependency.version.is_some() {
            if let Some(target) = targets.as_ref().and_then(|t| t.native(dependency)) {
                if target.version.is_some() && target.version != dependency.version {
                    warn!(
                        "[cauldron] {} differs from manifest target {} for platform {}",
                        dependency, target, ern_platform_version
                    );
                }
            }
            return Ok(dependency.clone());
        }

        let from_cauldron = doc
            .manifest
            .target_native_dependencies
            .iter()
            .find(|d| d.same_package(dependency) && d.version.is_some())
            .cloned();
        let from_targets = || {
            targets
                .as_ref()
                .and_then(|t| t.native(dependency))
                .filter(|d| d.version.is_some())
                .cloned()
        };
        let from_plugins = || {
            self.manifest
                .as_ref()
                .and_then(|m| m.get_plugin(&dependency.package()))
                .filter(|d| d.version.is_some())
        };

        from_cauldron
            .or_else(from_targets)
            .or_else(from_plugins)
            .map(|resolved| {
                debug!("[cauldron] Resolved {} to {}", dependency, resolved);
                resolved
            })
            .ok_or_else(|| {
                Error::invalid(
                    "nativeDeps",
                    format!(
                        "no version given for {} and none found in the manifest",
                        dependency
                    ),
                )
            })
    }

    // ------------------------------------------------------------------
    // Binaries and source maps
    // ------------------------------------------------------------------

    /// Store the binary at `path` for a version and record its location.
    ///
    /// The blob is pushed right away; the version's `binary` field changes
    /// with the pending transaction.
    pub fn create_native_binary(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        path: &Path,
    ) -> Result<PathBuf> {
        let coords = descriptor.require_complete()?;
        let content = fs::read(path)?;
        let mut doc = self.load()?;
        doc.version(coords)?;

        let stored = self.binaries.store(&mut self.repo, coords, &content)?;
        doc.version_mut(coords)?.binary = Some(stored.to_string_lossy().replace('\\', "/"));
        self.save(&doc)?;
        Ok(stored)
    }

    pub fn get_native_binary(&mut self, descriptor: &NativeApplicationDescriptor) -> Result<Vec<u8>> {
        let coords = descriptor.require_complete()?;
        self.binaries.retrieve(&mut self.repo, coords)
    }

    pub fn create_source_map(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        path: &Path,
    ) -> Result<PathBuf> {
        let coords = descriptor.require_complete()?;
        let content = fs::read(path)?;
        self.load()?.version(coords)?;
        self.source_maps.store(&mut self.repo, coords, &content)
    }

    pub fn get_source_map(&mut self, descriptor: &NativeApplicationDescriptor) -> Result<Vec<u8>> {
        let coords = descriptor.require_complete()?;
        self.source_maps.retrieve(&mut self.repo, coords)
    }

    // ------------------------------------------------------------------
    // Mini-apps
    // ------------------------------------------------------------------

    pub fn add_container_mini_app(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        mini_app: &Dependency,
    ) -> Result<()> {
        let coords = descriptor.require_complete()?;
        require_version(mini_app, "miniApps.container")?;
        let mut doc = self.load()?;
        let version = mutable_version(&mut doc, coords, "Cannot add a container mini-app")?;
        if insert_unique(
            &mut version.mini_apps.container,
            mini_app,
            "container mini-app",
            coords,
        )? {
            self.save(&doc)?;
            info!(
                "[cauldron] Added container mini-app {} to {}",
                mini_app,
                describe(coords)
            );
        }
        Ok(())
    }

    pub fn remove_container_mini_app(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        mini_app: &Dependency,
    ) -> Result<()> {
        let coords = descriptor.require_complete()?;
        let mut doc = self.load()?;
        let version = mutable_version(&mut doc, coords, "Cannot remove a container mini-app")?;
        let removed = remove_existing(
            &mut version.mini_apps.container,
            mini_app,
            "container mini-app",
            coords,
        )?;
        self.save(&doc)?;
        info!(
            "[cauldron] Removed container mini-app {} from {}",
            removed,
            describe(coords)
        );
        Ok(())
    }

    /// Replace the version of a container mini-app already present.
    pub fn update_mini_app_version(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        mini_app: &Dependency,
    ) -> Result<()> {
        let coords = descriptor.require_complete()?;
        require_version(mini_app, "miniApps.container")?;
        let mut doc = self.load()?;
        let version = mutable_version(&mut doc, coords, "Cannot update a mini-app version")?;
        replace_existing(
            &mut version.mini_apps.container,
            mini_app,
            "container mini-app",
            coords,
        )?;
        self.save(&doc)?;
        info!(
            "[cauldron] Updated container mini-app {} in {}",
            mini_app,
            describe(coords)
        );
        Ok(())
    }

    pub fn get_container_mini_apps(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
    ) -> Result<Vec<Dependency>> {
        let coords = descriptor.require_complete()?;
        Ok(self.load()?.version(coords)?.mini_apps.container.clone())
    }

    pub fn get_container_mini_app(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        name: &str,
    ) -> Result<Dependency> {
        let coords = descriptor.require_complete()?;
        let doc = self.load()?;
        find_package(
            &doc.version(coords)?.mini_apps.container,
            name,
            "container mini-app",
            coords,
        )
    }

    /// Record a batch of mini-apps shipped over the air.
    ///
    /// Allowed on released versions: that is what code push is for.
    pub fn add_code_push_mini_apps(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        mini_apps: &[Dependency],
    ) -> Result<()> {
        let coords = descriptor.require_complete()?;
        if mini_apps.is_empty() {
            return Err(Error::invalid(
                "miniApps.ota",
                "a code push batch must contain at least one mini-app",
            ));
        }
        for mini_app in mini_apps {
            require_version(mini_app, "miniApps.ota")?;
        }
        let mut doc = self.load()?;
        doc.version_mut(coords)?
            .mini_apps
            .ota
            .push(mini_apps.to_vec());
        self.save(&doc)?;
        info!(
            "[cauldron] Added code push batch of {} mini-app(s) to {}",
            mini_apps.len(),
            describe(coords)
        );
        Ok(())
    }

    /// Code push batches of a version, oldest first.
    pub fn get_code_push_mini_apps(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
    ) -> Result<Vec<Vec<Dependency>>> {
        let coords = descriptor.require_complete()?;
        Ok(self.load()?.version(coords)?.mini_apps.ota.clone())
    }

    // ------------------------------------------------------------------
    // Version fields
    // ------------------------------------------------------------------

    pub fn update_version(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        patch: &VersionPatch,
    ) -> Result<()> {
        let coords = descriptor.require_complete()?;
        patch.validate()?;
        let mut doc = self.load()?;
        patch.apply(doc.version_mut(coords)?);
        self.save(&doc)?;
        info!("[cauldron] Updated {}", describe(coords));
        Ok(())
    }

    pub fn update_native_app_is_released(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        is_released: bool,
    ) -> Result<()> {
        self.update_version(
            descriptor,
            &VersionPatch {
                is_released: Some(is_released),
                ..Default::default()
            },
        )
    }

    pub fn update_container_version(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
        container_version: &str,
    ) -> Result<()> {
        validate_container_version(container_version)?;
        self.update_version(
            descriptor,
            &VersionPatch {
                container_version: Some(container_version.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn get_container_version(
        &mut self,
        descriptor: &NativeApplicationDescriptor,
    ) -> Result<Option<String>> {
        let coords = descriptor.require_complete()?;
        Ok(self.load()?.version(coords)?.container_version.clone())
    }

    // ------------------------------------------------------------------
    // Config
    // ------------------------------------------------------------------

    /// Most specific config for the descriptor: version, then platform, then
    /// application. Missing nodes count as having no config.
    pub fn get_config(&mut self, descriptor: &NativeApplicationDescriptor) -> Result<Option<Value>> {
        let doc = self.load()?;
        let Some(app) = doc.native_apps.iter().find(|a| a.name == descriptor.name) else {
            return Ok(None);
        };
        let platform = descriptor.platform.and_then(|p| app.platform(p));
        let version = platform.and_then(|p| descriptor.version.as_deref().and_then(|v| p.version(v)));

        Ok(version
            .and_then(|v| v.config.clone())
            .or_else(|| platform.and_then(|p| p.config.clone()))
            .or_else(|| app.config.clone()))
    }

    /// Set the config of the node the descriptor addresses.
    pub fn set_config(&mut self, descriptor: &NativeApplicationDescriptor, config: Value) -> Result<()> {
        if !config.is_object() {
            return Err(Error::invalid("config", "must be an object"));
        }
        let mut doc = self.load()?;
        match (descriptor.platform, descriptor.version.as_deref()) {
            (None, _) => doc.app_mut(&descriptor.name)?.config = Some(config),
            (Some(platform), None) => {
                doc.platform_mut(&descriptor.name, platform)?.config = Some(config)
            }
            (Some(platform), Some(version)) => {
                let coords = VersionCoordinates {
                    name: &descriptor.name,
                    platform,
                    version,
                };
                doc.version_mut(coords)?.config = Some(config)
            }
        }
        self.save(&doc)?;
        info!("[cauldron] Set config of {}", descriptor);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Manifest
    // ------------------------------------------------------------------

    /// Target dependency lists recorded in the Cauldron.
    pub fn get_manifest(&mut self) -> Result<ManifestOverrides> {
        Ok(self.load()?.manifest)
    }

    /// Add or replace (by package) a target JS dependency.
    pub fn add_target_js_dependency_to_manifest(&mut self, dependency: &Dependency) -> Result<()> {
        require_version(dependency, "manifest.targetJsDependencies")?;
        let mut doc = self.load()?;
        upsert(&mut doc.manifest.target_js_dependencies, dependency);
        self.save(&doc)?;
        info!("[cauldron] Manifest now targets {}", dependency);
        Ok(())
    }

    /// Add or replace (by package) a target native dependency.
    pub fn add_target_native_dependency_to_manifest(
        &mut self,
        dependency: &Dependency,
    ) -> Result<()> {
        require_version(dependency, "manifest.targetNativeDependencies")?;
        let mut doc = self.load()?;
        upsert(&mut doc.manifest.target_native_dependencies, dependency);
        self.save(&doc)?;
        info!("[cauldron] Manifest now targets {}", dependency);
        Ok(())
    }
}

impl Transactional for Cauldron {
    fn begin_transaction(&mut self) -> Result<()> {
        self.repo.begin_transaction()
    }

    fn discard_transaction(&mut self) -> Result<()> {
        self.repo.discard_transaction()
    }

    fn commit_transaction(&mut self, message: CommitMessage) -> Result<()> {
        self.repo.commit_transaction(message)
    }
}

/// The version at `coords`, provided it is not released.
fn mutable_version<'d>(
    doc: &'d mut CauldronDocument,
    coords: VersionCoordinates<'_>,
    operation: &str,
) -> Result<&'d mut NativeApplicationVersion> {
    let version = doc.version_mut(coords)?;
    if version.is_released {
        return Err(Error::ReleasedVersionImmutable {
            descriptor: describe(coords),
            operation: operation.to_string(),
        });
    }
    Ok(version)
}

fn require_version(dependency: &Dependency, field: &str) -> Result<()> {
    if dependency.version.is_none() {
        return Err(Error::invalid(
            field,
            format!("{} must specify a version", dependency),
        ));
    }
    Ok(())
}

/// Push `dependency` unless its package is already listed. Returns `false`
/// when the identical entry is present.
fn insert_unique(
    list: &mut Vec<Dependency>,
    dependency: &Dependency,
    kind: &str,
    coords: VersionCoordinates<'_>,
) -> Result<bool> {
    match list.iter().find(|d| d.same_package(dependency)) {
        Some(existing) if existing == dependency => Ok(false),
        Some(existing) => Err(Error::AlreadyExists {
            what: format!("{} {} in {}", kind, existing, describe(coords)),
        }),
        None => {
            list.push(dependency.clone());
            Ok(true)
        }
    }
}

fn replace_existing(
    list: &mut [Dependency],
    dependency: &Dependency,
    kind: &str,
    coords: VersionCoordinates<'_>,
) -> Result<()> {
    let entry = list
        .iter_mut()
        .find(|d| d.same_package(dependency))
        .ok_or_else(|| {
            Error::not_found(format!(
                "{} {} in {}",
                kind,
                dependency.package(),
                describe(coords)
            ))
        })?;
    *entry = dependency.clone();
    Ok(())
}

fn remove_existing(
    list: &mut Vec<Dependency>,
    dependency: &Dependency,
    kind: &str,
    coords: VersionCoordinates<'_>,
) -> Result<Dependency> {
    let index = list
        .iter()
        .position(|d| d.same_package(dependency))
        .ok_or_else(|| {
            Error::not_found(format!(
                "{} {} in {}",
                kind,
                dependency.package(),
                describe(coords)
            ))
        })?;
    Ok(list.remove(index))
}

fn find_package(
    list: &[Dependency],
    name: &str,
    kind: &str,
    coords: VersionCoordinates<'_>,
) -> Result<Dependency> {
    list.iter()
        .find(|d| d.package() == name)
        .cloned()
        .ok_or_else(|| Error::not_found(format!("{} {} in {}", kind, name, describe(coords))))
}

fn upsert(list: &mut Vec<Dependency>, dependency: &Dependency) {
    match list.iter_mut().find(|d| d.same_package(dependency)) {
        Some(entry) => *entry = dependency.clone(),
        None => list.push(dependency.clone()),
    }
}
