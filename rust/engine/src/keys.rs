// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena keys for classified meshes.
//!
//! Generations recycle a single arena. Installing a new generation clears it,
//! which bumps every slot version, so keys from a replaced generation stop
//! resolving.

use slotmap::new_key_type;

new_key_type! {
    /// Key for an imported mesh within one model generation.
    pub struct MeshKey;
}
